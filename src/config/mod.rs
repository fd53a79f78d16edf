//! # Configuration
//!
//! Controller settings loaded from the environment, with command line
//! overrides applied on top.

pub mod controller;

pub use controller::ControllerConfig;
