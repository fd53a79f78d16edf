//! # Event Bridge
//!
//! Turns change notifications into work queue adds.
//!
//! Event payloads are thrown away: every pass re-reads all state, so a
//! notification is only a signal that something may have changed.

use crate::constants::WORK_QUEUE_KEY;
use crate::controller::workqueue::WorkQueue;
use crate::observability;
use crate::provider::ResourceEvent;
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Observer for change notifications
pub trait ResourceEventHandler: Send + Sync {
    fn on_event(&self, event: ResourceEvent);
}

/// Enqueues the single well-known key on every event
#[derive(Debug, Clone)]
pub struct EventBridge {
    queue: WorkQueue<String>,
}

impl EventBridge {
    #[must_use]
    pub fn new(queue: WorkQueue<String>) -> Self {
        Self { queue }
    }
}

impl ResourceEventHandler for EventBridge {
    fn on_event(&self, event: ResourceEvent) {
        debug!(event = event.as_str(), "change notification, queueing sync");
        self.queue.add(WORK_QUEUE_KEY.to_string());
    }
}

/// Feed every event from `events` into `handler` until the stream ends
pub fn spawn_event_pump(
    source: &'static str,
    mut events: BoxStream<'static, ResourceEvent>,
    handler: Arc<dyn ResourceEventHandler>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(source, "watching for changes");
        while let Some(event) = events.next().await {
            observability::metrics::increment_events_received(source, event.as_str());
            handler.on_event(event);
        }
        info!(source, "change stream ended");
    })
}
