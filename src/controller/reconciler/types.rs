//! # Types
//!
//! Core types for the reconciler.

use crate::provider::{ClusterOperatorStore, OperatorStatusProvider, ProviderError, StoreError};
use std::sync::Arc;
use thiserror::Error;

/// Store call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Get,
    Create,
    UpdateStatus,
    Delete,
}

impl StoreOperation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::Get => "get",
            StoreOperation::Create => "create",
            StoreOperation::UpdateStatus => "update_status",
            StoreOperation::Delete => "delete",
        }
    }
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to read operator status: {0}")]
    Provider(#[source] ProviderError),
    #[error("ClusterOperator {operation} failed: {source}")]
    Store {
        operation: StoreOperation,
        #[source]
        source: StoreError,
    },
    #[error("failed to encode condition: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("sync pass panicked: {0}")]
    Panicked(String),
}

impl ReconcilerError {
    pub(crate) fn store(operation: StoreOperation) -> impl FnOnce(StoreError) -> Self {
        move |source| ReconcilerError::Store { operation, source }
    }
}

/// What a successful pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Desired and existing objects were equal, nothing was written
    Unchanged,
    /// Status subresource was replaced
    Updated,
    /// Object was created and its status written
    Created,
    /// Status source is gone, so the ClusterOperator was deleted
    Deleted,
    /// The ClusterOperator API is not served yet; retry later with backoff
    ApiNotRegistered,
}

impl SyncOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::Unchanged => "unchanged",
            SyncOutcome::Updated => "updated",
            SyncOutcome::Created => "created",
            SyncOutcome::Deleted => "deleted",
            SyncOutcome::ApiNotRegistered => "api-not-registered",
        }
    }

    /// Whether the pass still wants a rate-limited retry
    #[must_use]
    pub fn needs_retry(&self) -> bool {
        matches!(self, SyncOutcome::ApiNotRegistered)
    }
}

/// Syncs one operator's status into one ClusterOperator
#[derive(Clone)]
pub struct Reconciler {
    pub(crate) namespace: String,
    pub(crate) name: String,
    pub(crate) provider: Arc<dyn OperatorStatusProvider>,
    pub(crate) store: Arc<dyn ClusterOperatorStore>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// `namespace` may be empty for a cluster-scoped ClusterOperator
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        provider: Arc<dyn OperatorStatusProvider>,
        store: Arc<dyn ClusterOperatorStore>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            provider,
            store,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn OperatorStatusProvider> {
        &self.provider
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ClusterOperatorStore> {
        &self.store
    }
}
