//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_BACKOFF_MAX_MS, DEFAULT_BACKOFF_START_MS, DEFAULT_CLUSTER_OPERATOR_NAME,
    DEFAULT_LOG_FORMAT, DEFAULT_LOG_LEVEL, DEFAULT_METRICS_PORT, DEFAULT_OPERATOR_GROUP,
    DEFAULT_OPERATOR_KIND, DEFAULT_OPERATOR_NAME, DEFAULT_OPERATOR_PLURAL,
    DEFAULT_OPERATOR_VERSION,
};
use crate::observability::logging::LogFormat;
use crate::provider::ResourceRef;
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have defaults and can be overridden via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Name of the ClusterOperator to keep up to date
    pub cluster_operator_name: String,
    /// Namespace of the ClusterOperator, empty when cluster-scoped
    pub cluster_operator_namespace: String,
    /// Operator resource the detailed status is read from
    pub operator_resource: ResourceRef,
    /// Exponential backoff starting value (milliseconds)
    pub backoff_start_ms: u64,
    /// Exponential backoff maximum value (milliseconds)
    pub backoff_max_ms: u64,
    /// Port of the metrics and probe server
    pub metrics_port: u16,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
    /// Serve `/metrics`, `/healthz` and `/readyz`
    pub enable_metrics: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let vars = Vars(lookup);
        Self {
            cluster_operator_name: vars
                .string("CLUSTER_OPERATOR_NAME", DEFAULT_CLUSTER_OPERATOR_NAME),
            cluster_operator_namespace: vars.string("CLUSTER_OPERATOR_NAMESPACE", ""),
            operator_resource: ResourceRef {
                group: vars.string("OPERATOR_RESOURCE_GROUP", DEFAULT_OPERATOR_GROUP),
                version: vars.string("OPERATOR_RESOURCE_VERSION", DEFAULT_OPERATOR_VERSION),
                kind: vars.string("OPERATOR_RESOURCE_KIND", DEFAULT_OPERATOR_KIND),
                plural: vars.string("OPERATOR_RESOURCE_PLURAL", DEFAULT_OPERATOR_PLURAL),
                namespace: vars.string("OPERATOR_RESOURCE_NAMESPACE", ""),
                name: vars.string("OPERATOR_RESOURCE_NAME", DEFAULT_OPERATOR_NAME),
            },
            backoff_start_ms: vars.parsed("BACKOFF_START_MS", DEFAULT_BACKOFF_START_MS),
            backoff_max_ms: vars.parsed("BACKOFF_MAX_MS", DEFAULT_BACKOFF_MAX_MS),
            metrics_port: vars.parsed("METRICS_PORT", DEFAULT_METRICS_PORT),
            log_level: vars.string("LOG_LEVEL", DEFAULT_LOG_LEVEL),
            log_format: vars.string("LOG_FORMAT", DEFAULT_LOG_FORMAT),
            enable_metrics: vars.bool("ENABLE_METRICS", true),
        }
    }

    /// Get backoff start duration
    #[must_use]
    pub fn backoff_start_duration(&self) -> Duration {
        Duration::from_millis(self.backoff_start_ms)
    }

    /// Get backoff max duration
    #[must_use]
    pub fn backoff_max_duration(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse(&self.log_format)
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// Read variable as string or return default
    fn string(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    /// Read variable or return default value when unset or unparsable
    fn parsed<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        (self.0)(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Read variable as boolean or return default
    fn bool(&self, key: &str, default: bool) -> bool {
        (self.0)(key).map_or(default, |v| {
            matches!(
                v.trim().to_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            )
        })
    }
}
