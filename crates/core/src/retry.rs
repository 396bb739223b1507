//! Retry logic with exponential backoff
//!
//! The delay before attempt `n` (0-based) is `base_delay * 2^n`, capped at
//! `max_delay`. With the default one-second base this gives waits of 2s and
//! 4s ahead of the second and third attempts.
//!
//! # Example
//!
//! ```rust,no_run
//! use rehab_core::retry::{retry_async, RetryConfig};
//!
//! # async fn demo() {
//! let outcome = retry_async(&RetryConfig::quick(), |_: &&str| true, |_attempt| async {
//!     Ok::<_, &str>("success")
//! })
//! .await;
//! assert!(outcome.is_ok());
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Backoff base; the wait before attempt `n` is `base_delay * 2^n`
    pub base_delay: Duration,
    /// Upper bound for a single wait
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Short waits, for local development
    pub fn quick() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(200),
        }
    }

    /// More attempts and longer waits, for flaky mobile links
    pub fn patient() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }

    /// A single attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Same policy with a different attempt budget (at least one)
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Calculate the wait before a given attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// Successful retry outcome with attempt information
#[derive(Debug)]
pub struct RetryResult<T> {
    /// The successful result
    pub value: T,
    /// Number of attempts made
    pub attempts: u32,
    /// Total time spent, waits included
    pub total_duration: Duration,
}

/// Failed retry outcome
#[derive(Debug)]
pub struct RetryError<E> {
    /// Error from the last attempt
    pub error: E,
    /// Number of attempts made
    pub attempts: u32,
    /// Whether the last error was retryable and the budget ran out
    pub exhausted: bool,
}

/// Run `op` until it succeeds, returns a non-retryable error, or the attempt
/// budget is spent.
///
/// `op` receives the 0-based attempt number. Only errors for which
/// `should_retry` returns true lead to another attempt.
pub async fn retry_async<T, E, F, Fut, P>(
    config: &RetryConfig,
    mut should_retry: P,
    mut op: F,
) -> Result<RetryResult<T>, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
{
    let start = Instant::now();
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = config.delay_for_attempt(attempt);
            debug!(attempt, delay_ms = delay.as_millis(), "Retrying after delay");
            tokio::time::sleep(delay).await;
        }

        match op(attempt).await {
            Ok(value) => {
                return Ok(RetryResult {
                    value,
                    attempts: attempt + 1,
                    total_duration: start.elapsed(),
                });
            }
            Err(error) => {
                let retryable = should_retry(&error);
                if !retryable || attempt + 1 >= max_attempts {
                    return Err(RetryError {
                        error,
                        attempts: attempt + 1,
                        exhausted: retryable,
                    });
                }
            }
        }

        attempt += 1;
    }
}
