//! # Work Queue
//!
//! Rate-limited, deduplicating work queue.
//!
//! Keys move through three sets:
//!
//! - `queue`: waiting to be handed out by [`WorkQueue::get`]
//! - `dirty`: needs processing (superset of `queue`)
//! - `processing`: handed out and not yet marked [`WorkQueue::done`]
//!
//! A key is never queued twice, and a key added while it is being processed
//! is queued again exactly once when the worker calls `done`. Any burst of
//! adds therefore collapses into at most one pending pass.

use crate::controller::backoff::ExponentialBackoff;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, trace};

pub struct WorkQueue<K> {
    inner: Arc<Inner<K>>,
}

struct Inner<K> {
    name: String,
    state: Mutex<QueueState<K>>,
    notify: Notify,
    backoff: ExponentialBackoff,
}

struct QueueState<K> {
    queue: VecDeque<K>,
    dirty: HashSet<K>,
    processing: HashSet<K>,
    /// Consecutive failures per key, cleared by `forget`
    failures: HashMap<K, ExponentialBackoff>,
    shutting_down: bool,
}

impl<K> Clone for WorkQueue<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> std::fmt::Debug for WorkQueue<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl<K> WorkQueue<K>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
{
    /// Create a queue whose rate limiter starts at `backoff_base` and never
    /// waits longer than `backoff_max`.
    pub fn new(name: impl Into<String>, backoff_base: Duration, backoff_max: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                state: Mutex::new(QueueState {
                    queue: VecDeque::new(),
                    dirty: HashSet::new(),
                    processing: HashSet::new(),
                    failures: HashMap::new(),
                    shutting_down: false,
                }),
                notify: Notify::new(),
                backoff: ExponentialBackoff::new(backoff_base, backoff_max),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    fn state(&self) -> MutexGuard<'_, QueueState<K>> {
        // A panic while holding the lock leaves the sets consistent, so keep going
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `key` as needing processing. Idempotent while the key is pending.
    pub fn add(&self, key: K) {
        let mut state = self.state();
        if state.shutting_down {
            trace!(queue = %self.inner.name, ?key, "queue shutting down, dropping add");
            return;
        }
        if !state.dirty.insert(key.clone()) {
            trace!(queue = %self.inner.name, ?key, "key already pending");
            return;
        }
        if state.processing.contains(&key) {
            // Re-queued by done()
            return;
        }
        state.queue.push_back(key);
        drop(state);
        self.inner.notify.notify_one();
    }

    /// Wait for the next key. Returns `None` once the queue is shutting down
    /// and has nothing left to hand out.
    pub async fn get(&self) -> Option<K> {
        loop {
            let mut notified = pin!(self.inner.notify.notified());
            // Register before checking state so a wakeup between the check
            // and the await is not lost
            notified.as_mut().enable();
            {
                let mut state = self.state();
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    return Some(key);
                }
                if state.shutting_down {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Finish processing `key`. If it was added again meanwhile it goes
    /// back on the queue.
    pub fn done(&self, key: &K) {
        let mut state = self.state();
        state.processing.remove(key);
        if state.dirty.contains(key) {
            state.queue.push_back(key.clone());
            drop(state);
            self.inner.notify.notify_one();
        }
    }

    /// Clear the failure history of `key`
    pub fn forget(&self, key: &K) {
        self.state().failures.remove(key);
    }

    /// Consecutive failures recorded for `key`
    #[must_use]
    pub fn num_requeues(&self, key: &K) -> u32 {
        self.state()
            .failures
            .get(key)
            .map_or(0, ExponentialBackoff::failures)
    }

    /// Record a failure for `key` and return how long it should wait
    pub fn when(&self, key: &K) -> Duration {
        let mut state = self.state();
        state
            .failures
            .entry(key.clone())
            .or_insert_with(|| self.inner.backoff.clone())
            .next_backoff()
    }

    /// Add `key` after `delay` has passed
    pub fn add_after(&self, key: K, delay: Duration) {
        if self.is_shutting_down() {
            return;
        }
        if delay.is_zero() {
            self.add(key);
            return;
        }
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(key);
        });
    }

    /// Add `key` once its rate limiter allows it. Returns the delay used.
    pub fn add_rate_limited(&self, key: K) -> Duration {
        let delay = self.when(&key);
        debug!(
            queue = %self.inner.name,
            ?key,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "requeue with backoff"
        );
        self.add_after(key, delay);
        delay
    }

    /// Number of keys waiting to be handed out
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop accepting keys and wake every blocked `get`
    pub fn shutdown(&self) {
        self.state().shutting_down = true;
        self.inner.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.state().shutting_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> WorkQueue<&'static str> {
        WorkQueue::new("test", Duration::from_millis(5), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_add_deduplicates_pending_key() {
        let queue = queue();
        queue.add("instance");
        queue.add("instance");
        queue.add("instance");

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get().await, Some("instance"));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_add_during_processing_requeues_once_after_done() {
        let queue = queue();
        queue.add("instance");
        let key = queue.get().await.unwrap();

        for _ in 0..5 {
            queue.add("instance");
        }
        // In flight, so nothing is handed out yet
        assert!(queue.is_empty());

        queue.done(&key);
        assert_eq!(queue.len(), 1);

        let key = queue.get().await.unwrap();
        queue.done(&key);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_done_without_new_add_does_not_requeue() {
        let queue = queue();
        queue.add("instance");
        let key = queue.get().await.unwrap();
        queue.done(&key);

        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_wakes_blocked_get() {
        let queue = queue();
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.get().await })
        };
        tokio::task::yield_now().await;

        queue.shutdown();

        assert_eq!(waiter.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_shutdown_drains_pending_keys_first() {
        let queue = queue();
        queue.add("instance");
        queue.shutdown();

        assert_eq!(queue.get().await, Some("instance"));
        assert_eq!(queue.get().await, None);
    }

    #[tokio::test]
    async fn test_add_after_shutdown_is_ignored() {
        let queue = queue();
        queue.shutdown();
        queue.add("instance");

        assert!(queue.is_empty());
        assert!(queue.is_shutting_down());
    }

    #[tokio::test]
    async fn test_rate_limiter_grows_and_forget_resets() {
        let queue = queue();

        assert_eq!(queue.when(&"instance"), Duration::from_millis(5));
        assert_eq!(queue.when(&"instance"), Duration::from_millis(10));
        assert_eq!(queue.when(&"instance"), Duration::from_millis(20));
        assert_eq!(queue.num_requeues(&"instance"), 3);

        queue.forget(&"instance");

        assert_eq!(queue.num_requeues(&"instance"), 0);
        assert_eq!(queue.when(&"instance"), Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_rate_limiter_is_per_key() {
        let queue = queue();
        queue.when(&"a");
        queue.when(&"a");

        assert_eq!(queue.when(&"b"), Duration::from_millis(5));
        assert_eq!(queue.num_requeues(&"a"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_rate_limited_enqueues_after_delay() {
        let queue = queue();

        let delay = queue.add_rate_limited("instance");
        assert_eq!(delay, Duration::from_millis(5));
        assert!(queue.is_empty());

        let key = tokio::time::timeout(Duration::from_secs(1), queue.get())
            .await
            .unwrap();
        assert_eq!(key, Some("instance"));
    }
}
