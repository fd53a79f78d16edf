//! # Reconciler
//!
//! One full sync pass from the operator's detailed status to its
//! ClusterOperator.
//!
//! ## Reconciliation Flow
//!
//! 1. Read the detailed status (source gone: delete the ClusterOperator)
//! 2. Read the ClusterOperator (missing: start from an empty object)
//! 3. Build the desired object with regenerated `status.conditions`
//! 4. Stop if nothing changed
//! 5. Update the status subresource, falling back to create + update
//!    when the object does not exist

pub mod reconcile;
pub mod types;

// Re-export public API
pub use reconcile::desired_cluster_operator;
pub use types::{Reconciler, ReconcilerError, StoreOperation, SyncOutcome};
