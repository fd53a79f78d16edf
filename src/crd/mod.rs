//! # Resource Types
//!
//! Kubernetes object shapes the controller reads and writes.
//!
//! ## Module Structure
//!
//! - `status.rs` - Condition types shared by both sides (`ConditionStatus`,
//!   the operator's detailed `OperatorStatus` and its conditions)
//! - `cluster_operator.rs` - The externally visible `ClusterOperator` object

mod cluster_operator;
mod status;

pub use cluster_operator::{ClusterOperator, ClusterOperatorCondition, ClusterOperatorStatus};
pub use status::{ConditionStatus, OperatorCondition, OperatorStatus};
