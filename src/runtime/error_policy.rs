//! # Error Policy
//!
//! What the worker does with a pass that did not finish cleanly: log it,
//! count it and put the key back with exponential backoff.

use crate::controller::reconciler::ReconcilerError;
use crate::controller::workqueue::WorkQueue;
use crate::observability;
use std::time::Duration;
use tracing::{error, info};

/// Requeue reason for failed passes
pub const REQUEUE_REASON_ERROR: &str = "error-backoff";

/// Requeue reason when the ClusterOperator API is not served yet
pub const REQUEUE_REASON_API_NOT_REGISTERED: &str = "api-not-registered";

/// Put `key` back on the queue through its rate limiter and log when the
/// next attempt is due. Returns the delay used.
pub fn schedule_retry(queue: &WorkQueue<String>, key: &str, reason: &str) -> Duration {
    let delay = queue.add_rate_limited(key.to_string());
    let attempts = queue.num_requeues(&key.to_string());

    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
    info!(
        key,
        reason,
        attempts,
        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        next_retry = %next_trigger_time.to_rfc3339(),
        "retry scheduled"
    );

    observability::metrics::increment_requeues_total(reason);
    delay
}

/// Handle a failed pass. The error never stops the worker.
pub fn handle_reconciliation_error(
    queue: &WorkQueue<String>,
    key: &str,
    error: &ReconcilerError,
) -> Duration {
    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "status_syncer.reconciliation_error",
        key,
        error = %error
    );
    let _error_guard = error_span.enter();

    error!(error = ?error, "{} failed", key);
    observability::metrics::increment_reconciliation_errors();

    schedule_retry(queue, key, REQUEUE_REASON_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;

    fn queue() -> WorkQueue<String> {
        WorkQueue::new("test", Duration::from_millis(5), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_errors_back_off_exponentially() {
        let queue = queue();
        let error = ReconcilerError::Provider(ProviderError::Other(anyhow::anyhow!("boom")));

        let first = handle_reconciliation_error(&queue, "instance", &error);
        let second = handle_reconciliation_error(&queue, "instance", &error);
        let third = handle_reconciliation_error(&queue, "instance", &error);

        assert_eq!(first, Duration::from_millis(5));
        assert_eq!(second, Duration::from_millis(10));
        assert_eq!(third, Duration::from_millis(20));
        assert_eq!(queue.num_requeues(&"instance".to_string()), 3);
    }

    #[tokio::test]
    async fn test_forget_resets_retry_delay() {
        let queue = queue();

        schedule_retry(&queue, "instance", REQUEUE_REASON_API_NOT_REGISTERED);
        schedule_retry(&queue, "instance", REQUEUE_REASON_API_NOT_REGISTERED);
        queue.forget(&"instance".to_string());

        assert_eq!(
            schedule_retry(&queue, "instance", REQUEUE_REASON_ERROR),
            Duration::from_millis(5)
        );
    }
}
