//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// The only key the work queue ever holds.
/// Every reconcile pass re-derives the full state, so one key is enough.
pub const WORK_QUEUE_KEY: &str = "instance";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default exponential backoff starting value (milliseconds)
pub const DEFAULT_BACKOFF_START_MS: u64 = 5;

/// Default exponential backoff maximum value (milliseconds)
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 1_000_000;

/// Suffix that marks a provider condition as part of the failing family
pub const FAILING_CONDITION_SUFFIX: &str = "Failing";

/// Reason written on the aggregate Failing condition when more than one
/// failing-family condition is True
pub const MULTIPLE_CONDITIONS_FAILING_REASON: &str = "multiple conditions failing";

/// Well-known condition types
pub const CONDITION_TYPE_AVAILABLE: &str = "Available";
pub const CONDITION_TYPE_FAILING: &str = "Failing";
pub const CONDITION_TYPE_PROGRESSING: &str = "Progressing";

/// ClusterOperator API coordinates
pub const CLUSTER_OPERATOR_GROUP: &str = "config.openshift.io";
pub const CLUSTER_OPERATOR_VERSION: &str = "v1";
pub const CLUSTER_OPERATOR_KIND: &str = "ClusterOperator";
pub const CLUSTER_OPERATOR_PLURAL: &str = "clusteroperators";

/// Default operator resource the detailed status is read from
pub const DEFAULT_OPERATOR_GROUP: &str = "operator.openshift.io";
pub const DEFAULT_OPERATOR_VERSION: &str = "v1";
pub const DEFAULT_OPERATOR_KIND: &str = "KubeAPIServer";
pub const DEFAULT_OPERATOR_PLURAL: &str = "kubeapiservers";
pub const DEFAULT_OPERATOR_NAME: &str = "cluster";

/// Field manager / user agent name used for writes
pub const CONTROLLER_NAME: &str = "cluster-operator-status-controller";

/// Default ClusterOperator the status is mirrored into
pub const DEFAULT_CLUSTER_OPERATOR_NAME: &str = "kube-apiserver";

/// Default global log level
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Default log format (json, text)
pub const DEFAULT_LOG_FORMAT: &str = "json";
