//! # Controller
//!
//! Core controller modules for the ClusterOperator status controller.
//!
//! - `backoff`: Exponential backoff for retries
//! - `conditions`: Operator condition to ClusterOperator condition translation
//! - `events`: Change notifications into work queue adds
//! - `reconciler`: Core reconciliation logic
//! - `server`: HTTP server for metrics and health checks
//! - `workqueue`: Single-flight, rate-limited work queue

pub mod backoff;
pub mod conditions;
pub mod events;
pub mod reconciler;
pub mod server;
pub mod workqueue;
