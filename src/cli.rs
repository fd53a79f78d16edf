//! # Command Line
//!
//! Flags for the controller binary. Every flag is optional and overrides
//! the matching environment variable.
//!
//! ```bash
//! cluster-operator-status-controller --name etcd --log-format text
//! ```

use crate::config::ControllerConfig;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Json,
    Text,
}

impl LogFormatArg {
    fn as_str(self) -> &'static str {
        match self {
            LogFormatArg::Json => "json",
            LogFormatArg::Text => "text",
        }
    }
}

/// Mirrors an operator's detailed status conditions into its ClusterOperator
#[derive(Debug, Parser)]
#[command(name = "cluster-operator-status-controller", version, long_about = None)]
pub struct Cli {
    /// ClusterOperator name (env: CLUSTER_OPERATOR_NAME)
    #[arg(long)]
    pub name: Option<String>,

    /// ClusterOperator namespace, empty for cluster-scoped (env: CLUSTER_OPERATOR_NAMESPACE)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Metrics and probe server port (env: METRICS_PORT)
    #[arg(long)]
    pub metrics_port: Option<u16>,

    /// Log output format (env: LOG_FORMAT)
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormatArg>,
}

impl Cli {
    /// Apply the flags that were given on top of `config`
    pub fn apply(&self, config: &mut ControllerConfig) {
        if let Some(name) = &self.name {
            config.cluster_operator_name.clone_from(name);
        }
        if let Some(namespace) = &self.namespace {
            config.cluster_operator_namespace.clone_from(namespace);
        }
        if let Some(port) = self.metrics_port {
            config.metrics_port = port;
        }
        if let Some(format) = self.log_format {
            config.log_format = format.as_str().to_string();
        }
    }
}
