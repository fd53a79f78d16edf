//! # Runtime
//!
//! - `error_policy`: Logging, metrics and rate-limited requeue for failed passes
//! - `initialization`: Process setup (crypto, logging, metrics, server, client)
//! - `worker`: The single-worker run loop that drains the work queue

pub mod error_policy;
pub mod initialization;
pub mod worker;
