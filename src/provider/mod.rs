//! # Collaborators
//!
//! The two interfaces the reconciler talks to:
//!
//! - `OperatorStatusProvider` supplies the operator's detailed status and
//!   notifies about changes to it
//! - `ClusterOperatorStore` reads and writes the ClusterOperator object
//!
//! Both are scoped to a single object chosen at construction time.
//! `kubernetes.rs` implements them against the Kubernetes API.

use crate::crd::{ClusterOperator, OperatorStatus};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use thiserror::Error;

pub mod kubernetes;

pub use kubernetes::{KubeClusterOperatorStore, KubeOperatorStatusProvider, ResourceRef};

/// Change notification for a watched object.
/// The reconciler never looks at payloads, so events carry none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceEvent {
    Added,
    Updated,
    Deleted,
}

impl ResourceEvent {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceEvent::Added => "added",
            ResourceEvent::Updated => "updated",
            ResourceEvent::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The object the status is read from no longer exists
    #[error("operator status source {0} not found")]
    NotFound(String),
    #[error("failed to read operator status: {0}")]
    Other(#[from] anyhow::Error),
}

impl ProviderError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist. Returned by `create` when the resource
    /// type itself is not registered.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Source of the operator's detailed status
#[async_trait]
pub trait OperatorStatusProvider: Send + Sync {
    /// Current detailed status.
    ///
    /// `Ok(None)` means the source exists but has not published a status yet.
    async fn current_status(&self) -> Result<Option<OperatorStatus>, ProviderError>;

    /// Stream of changes to the status source
    fn subscribe(&self) -> BoxStream<'static, ResourceEvent>;
}

/// Store holding the ClusterOperator object
#[async_trait]
pub trait ClusterOperatorStore: Send + Sync {
    async fn get(&self) -> Result<ClusterOperator, StoreError>;

    async fn create(&self, operator: &ClusterOperator) -> Result<ClusterOperator, StoreError>;

    /// Replace the status subresource of `operator`
    async fn update_status(&self, operator: &ClusterOperator)
        -> Result<ClusterOperator, StoreError>;

    async fn delete(&self) -> Result<(), StoreError>;

    /// Stream of changes to the ClusterOperator itself. Stores that cannot
    /// watch return an empty stream.
    fn subscribe(&self) -> BoxStream<'static, ResourceEvent> {
        stream::empty().boxed()
    }
}
