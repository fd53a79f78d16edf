//! # ClusterOperator Status Controller
//!
//! Watches an operator resource and mirrors its `Available`, `*Failing`
//! and `Progressing` conditions into the matching `ClusterOperator`.
//!
//! Configuration comes from environment variables (see
//! `ControllerConfig`), with command line flags taking precedence.

use anyhow::Result;
use clap::Parser;
use cluster_operator_status_controller::cli::Cli;
use cluster_operator_status_controller::runtime::initialization::initialize;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let init = initialize(&cli).await?;

    init.syncer.run(shutdown_signal()).await;

    for pump in init.event_pumps {
        pump.abort();
    }
    info!("shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}
