//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use cluster_operator_status_controller::prelude::*;
//! ```

// Resource and condition types
pub use crate::crd::*;

// Collaborator traits and their errors
pub use crate::provider::{
    ClusterOperatorStore, OperatorStatusProvider, ProviderError, ResourceEvent, StoreError,
};

// Reconciler types
pub use crate::controller::reconciler::{Reconciler, ReconcilerError, SyncOutcome};

// Queue and run loop
pub use crate::controller::workqueue::WorkQueue;
pub use crate::runtime::worker::StatusSyncer;

pub use crate::config::ControllerConfig;
