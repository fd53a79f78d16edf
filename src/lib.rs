//! ClusterOperator Status Controller Library
//!
//! Keeps the conditions of an OpenShift `ClusterOperator` in step with the
//! detailed conditions an operator publishes on its own resource.
//!
//! ## Quick Start
//!
//! ```rust
//! use cluster_operator_status_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific
//! imports, use the individual modules.

pub mod cli;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
