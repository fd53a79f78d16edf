//! # Initialization
//!
//! Controller initialization: rustls setup, tracing, metrics, server
//! startup, Kubernetes client and collaborator wiring.

use crate::cli::Cli;
use crate::config::ControllerConfig;
use crate::constants::CONTROLLER_NAME;
use crate::controller::events::{spawn_event_pump, EventBridge, ResourceEventHandler};
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::controller::workqueue::WorkQueue;
use crate::observability;
use crate::provider::{
    ClusterOperatorStore, KubeClusterOperatorStore, KubeOperatorStatusProvider,
    OperatorStatusProvider,
};
use crate::runtime::worker::StatusSyncer;
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Everything `main` needs to run the controller
#[derive(Debug)]
pub struct InitializationResult {
    pub config: ControllerConfig,
    pub syncer: StatusSyncer,
    /// Event pumps for the status source and the ClusterOperator
    pub event_pumps: Vec<JoinHandle<()>>,
}

/// Initialize the controller runtime
///
/// Handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration and HTTP server startup
/// - Kubernetes client creation
/// - Provider, store, queue and event bridge wiring
///
/// # Errors
///
/// Returns an error if logging, metrics or the Kubernetes client cannot be
/// set up.
pub async fn initialize(cli: &Cli) -> Result<InitializationResult> {
    // Required for rustls 0.23+ before any TLS connection is made
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("failed to install rustls crypto provider");
    }

    let mut config = ControllerConfig::from_env();
    cli.apply(&mut config);

    observability::logging::init_tracing(&config.log_level, config.log_format())?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        cluster_operator = %config.cluster_operator_name,
        source = %config.operator_resource,
        "starting {}",
        CONTROLLER_NAME
    );

    let server_state = Arc::new(ServerState::default());
    if config.enable_metrics {
        observability::metrics::register_metrics()?;
        let state = Arc::clone(&server_state);
        let port = config.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = start_server(port, state).await {
                error!("HTTP server error: {}", e);
            }
        });
    }

    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;

    let provider: Arc<dyn OperatorStatusProvider> = Arc::new(KubeOperatorStatusProvider::new(
        client.clone(),
        config.operator_resource.clone(),
    ));
    let store: Arc<dyn ClusterOperatorStore> = Arc::new(KubeClusterOperatorStore::new(
        client,
        &config.cluster_operator_namespace,
        &config.cluster_operator_name,
    ));

    let queue = WorkQueue::new(
        format!("StatusSyncer-{}", config.cluster_operator_name),
        config.backoff_start_duration(),
        config.backoff_max_duration(),
    );
    let bridge: Arc<dyn ResourceEventHandler> = Arc::new(EventBridge::new(queue.clone()));
    let event_pumps = vec![
        spawn_event_pump("operator", provider.subscribe(), Arc::clone(&bridge)),
        spawn_event_pump("cluster_operator", store.subscribe(), bridge),
    ];

    let reconciler = Reconciler::new(
        config.cluster_operator_namespace.clone(),
        config.cluster_operator_name.clone(),
        provider,
        store,
    );

    Ok(InitializationResult {
        syncer: StatusSyncer::new(reconciler, queue, server_state),
        config,
        event_pumps,
    })
}
