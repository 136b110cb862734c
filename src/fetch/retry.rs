//! Retry with linear backoff for whole async operations.
//!
//! The policy decides whether another attempt is allowed and how long to wait
//! first; [`RetryPolicy::run_if`] drives an operation through it.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use postgrab_core::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, Duration::from_millis(100));
//! assert_eq!(
//!     policy.should_retry(true, 2),
//!     RetryDecision::Retry { delay: Duration::from_millis(200), attempt: 3 }
//! );
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Default number of attempts, the first one included.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Decision on whether to try a failed operation again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after `delay`.
    Retry {
        /// How long to wait before the next attempt.
        delay: Duration,
        /// The attempt number about to run (1-indexed).
        attempt: u32,
    },

    /// Give up and surface the last error.
    DoNotRetry {
        /// Why no further attempt is made.
        reason: String,
    },
}

/// Fixed-count retry with delay `base_delay × attempt`.
///
/// With defaults (3 attempts, 1 s base) the waits are 1 s then 2 s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Returns a copy with a different attempt count (clamped to at least one).
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Returns the attempt count, the first attempt included.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the base delay.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay before retrying after failed attempt `attempt` (1-indexed).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Decides what to do after attempt number `attempt` failed.
    #[must_use]
    pub fn should_retry(&self, retryable: bool, attempt: u32) -> RetryDecision {
        if !retryable {
            return RetryDecision::DoNotRetry {
                reason: "failure is not transient".to_string(),
            };
        }
        if attempt >= self.max_attempts {
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }
        RetryDecision::Retry {
            delay: self.delay_for(attempt),
            attempt: attempt + 1,
        }
    }

    /// Runs `operation` retrying every failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the final attempt.
    pub async fn run<T, E, F, Fut, O>(&self, operation: F, on_retry: O) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        O: FnMut(&E, u32),
    {
        self.run_if(operation, |_| true, on_retry).await
    }

    /// Runs `operation`, retrying failures for which `retryable` returns true.
    ///
    /// `on_retry` sees each failure and its attempt number before the wait;
    /// it is for diagnostics and cannot change the outcome.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the error of the final attempt.
    pub async fn run_if<T, E, F, Fut, R, O>(
        &self,
        mut operation: F,
        retryable: R,
        mut on_retry: O,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        O: FnMut(&E, u32),
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => match self.should_retry(retryable(&error), attempt) {
                    RetryDecision::Retry {
                        delay,
                        attempt: next,
                    } => {
                        on_retry(&error, attempt);
                        debug!(attempt, delay_ms = delay.as_millis(), "retrying after failure");
                        tokio::time::sleep(delay).await;
                        attempt = next;
                    }
                    RetryDecision::DoNotRetry { reason } => {
                        debug!(attempt, %reason, "not retrying");
                        return Err(error);
                    }
                },
            }
        }
    }
}
