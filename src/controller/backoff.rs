//! # Exponential Backoff
//!
//! Per-failure exponential backoff used by the work queue's rate limiter.
//!
//! Each consecutive failure doubles the delay, starting from `base` and capped
//! at `max`. A success resets the sequence.
//!
//! ## Usage
//!
//! ```rust
//! use cluster_operator_status_controller::controller::backoff::ExponentialBackoff;
//! use std::time::Duration;
//!
//! let mut backoff = ExponentialBackoff::new(Duration::from_millis(5), Duration::from_secs(1000));
//! assert_eq!(backoff.next_backoff(), Duration::from_millis(5));
//! assert_eq!(backoff.next_backoff(), Duration::from_millis(10));
//! assert_eq!(backoff.next_backoff(), Duration::from_millis(20));
//! ```

use std::time::Duration;

/// Exponential backoff calculator
///
/// The delay for the n-th consecutive failure (starting at zero) is
/// `base * 2^n`, never more than `max`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Delay for the first failure
    base: Duration,
    /// Upper bound for any delay
    max: Duration,
    /// Consecutive failures recorded since the last reset
    failures: u32,
}

impl ExponentialBackoff {
    /// Create a new backoff with the given base and maximum delays
    ///
    /// # Example
    ///
    /// ```
    /// use cluster_operator_status_controller::controller::backoff::ExponentialBackoff;
    /// use std::time::Duration;
    ///
    /// let backoff = ExponentialBackoff::new(Duration::from_millis(5), Duration::from_secs(1000));
    /// assert_eq!(backoff.failures(), 0);
    /// ```
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: 0,
        }
    }

    /// Get the delay for the next failure and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let delay = self.delay_for(self.failures);
        self.failures = self.failures.saturating_add(1);
        delay
    }

    /// Delay that the given failure count maps to, without advancing
    #[must_use]
    pub fn delay_for(&self, failures: u32) -> Duration {
        // 2^63 overflows any realistic base anyway, so clamp the shift
        let factor = 1u128 << failures.min(63);
        let nanos = self.base.as_nanos().saturating_mul(factor);
        if nanos >= self.max.as_nanos() {
            return self.max;
        }
        u64::try_from(nanos).map_or(self.max, Duration::from_nanos)
    }

    /// Number of consecutive failures recorded
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.failures = 0;
    }
}
