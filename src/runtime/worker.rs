//! # Worker
//!
//! `StatusSyncer` runs exactly one worker that pulls the key from the work
//! queue and runs a sync pass for it. Passes never overlap.
//!
//! The syncer is either running (`/readyz` is 200) or shutting down. Once
//! the stop signal fires the queue is shut down, the pass in flight runs to
//! completion and the worker exits.

use crate::constants::WORK_QUEUE_KEY;
use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::controller::server::ServerState;
use crate::controller::workqueue::WorkQueue;
use crate::observability;
use crate::runtime::error_policy::{
    handle_reconciliation_error, schedule_retry, REQUEUE_REASON_API_NOT_REGISTERED,
};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, Instrument};

/// Pause before a worker that exited early is started again
pub const WORKER_RESTART_DELAY: Duration = Duration::from_secs(1);

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[derive(Debug, Clone)]
pub struct StatusSyncer {
    reconciler: Arc<Reconciler>,
    queue: WorkQueue<String>,
    server_state: Arc<ServerState>,
}

impl StatusSyncer {
    #[must_use]
    pub fn new(
        reconciler: Reconciler,
        queue: WorkQueue<String>,
        server_state: Arc<ServerState>,
    ) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            queue,
            server_state,
        }
    }

    #[must_use]
    pub fn queue(&self) -> &WorkQueue<String> {
        &self.queue
    }

    #[must_use]
    pub fn server_state(&self) -> &Arc<ServerState> {
        &self.server_state
    }

    /// Take one key off the queue and sync it. Returns `false` once the
    /// queue has shut down.
    pub async fn process_next_work_item(&self) -> bool {
        let Some(key) = self.queue.get().await else {
            return false;
        };

        let span = tracing::info_span!(
            "status_syncer.reconcile",
            key = %key,
            namespace = %self.reconciler.namespace(),
            name = %self.reconciler.name(),
        );
        let start = Instant::now();
        // A panicking pass counts as a failed one so the key is still
        // marked done and retried
        let result = AssertUnwindSafe(self.reconciler.sync().instrument(span.clone()))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(ReconcilerError::Panicked(panic_message(&*payload))));
        observability::metrics::increment_reconciliations();
        observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

        let _guard = span.enter();
        match result {
            Ok(outcome) if outcome.needs_retry() => {
                debug!(outcome = outcome.as_str(), "sync pass finished, retry pending");
                schedule_retry(&self.queue, &key, REQUEUE_REASON_API_NOT_REGISTERED);
            }
            Ok(outcome) => {
                debug!(outcome = outcome.as_str(), "sync pass finished");
                self.queue.forget(&key);
            }
            Err(e) => {
                handle_reconciliation_error(&self.queue, &key, &e);
            }
        }
        self.queue.done(&key);
        true
    }

    fn spawn_worker(&self) -> JoinHandle<()> {
        let syncer = self.clone();
        tokio::spawn(async move { while syncer.process_next_work_item().await {} })
    }

    /// Run until `shutdown` resolves, then drain and stop the worker
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        info!(
            namespace = %self.reconciler.namespace(),
            name = %self.reconciler.name(),
            "starting status syncer"
        );

        // Covers the case where the status source does not exist at start
        // and so never produces an event.
        self.queue.add(WORK_QUEUE_KEY.to_string());
        self.server_state.set_ready(true);

        let mut shutdown = pin!(shutdown);
        let mut worker = self.spawn_worker();
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                result = &mut worker => {
                    match result {
                        Err(e) => error!(error = %e, "status syncer worker died, restarting"),
                        Ok(()) => error!("status syncer worker exited early, restarting"),
                    }
                    self.server_state.set_ready(false);
                    tokio::time::sleep(WORKER_RESTART_DELAY).await;
                    worker = self.spawn_worker();
                    self.server_state.set_ready(true);
                }
            }
        }

        info!("received shutdown signal, draining work queue");
        self.server_state.set_ready(false);
        self.queue.shutdown();

        if let Err(e) = worker.await {
            error!(error = %e, "status syncer worker panicked");
        }
        info!(name = %self.reconciler.name(), "status syncer stopped");
    }
}
