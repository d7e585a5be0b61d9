//! Retry with exponential backoff.

use crate::RetryConfig;
use novelweave_error::RetryableError;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry2::strategy::{jitter, ExponentialBackoff};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, warn};

/// How many times to run an operation and how long to wait in between.
///
/// Delays start at `base_delay` and double each attempt, capped at
/// `max_delay`.
///
/// # Example
///
/// ```
/// use novelweave_rate_limit::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(4, Duration::from_millis(100));
/// let delays: Vec<_> = policy.delays().collect();
/// assert_eq!(
///     delays,
///     vec![
///         Duration::from_millis(100),
///         Duration::from_millis(200),
///         Duration::from_millis(400),
///     ]
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_getters::Getters)]
pub struct RetryPolicy {
    /// Total attempts including the first
    max_attempts: u32,
    /// Delay before the second attempt
    base_delay: Duration,
    /// Upper bound for any single delay
    max_delay: Duration,
    /// Randomize delays
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_secs(config.max_delay_secs),
            jitter: config.jitter,
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempt count and base delay, no jitter.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(30),
            jitter: false,
        }
    }

    /// Run once, never retry.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Cap individual delays.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Randomize delays.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// The sleep before each retry, one entry per retry.
    pub fn delays(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        // from_millis(2) doubles each step; factor scales the first step to base_ms.
        let backoff = ExponentialBackoff::from_millis(2)
            .factor(base_ms / 2)
            .max_delay(self.max_delay)
            .take(self.max_attempts.saturating_sub(1) as usize);
        if self.jitter {
            Box::new(backoff.map(jitter))
        } else {
            Box::new(backoff)
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or attempts run out.
///
/// Errors whose [`RetryableError::is_retryable`] is false are returned at
/// once. On exhaustion the last error is returned.
///
/// # Example
///
/// ```
/// use novelweave_error::{ProviderError, ProviderErrorKind};
/// use novelweave_rate_limit::{retry_with_backoff, RetryPolicy};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = RetryPolicy::new(3, Duration::from_millis(1));
/// let result: Result<u8, ProviderError> =
///     retry_with_backoff(&policy, "example", || async { Ok(7) }).await;
/// assert_eq!(result.unwrap(), 7);
/// # }
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + Display,
{
    let attempts = AtomicU32::new(0);
    let max_attempts = policy.max_attempts;

    Retry::spawn(policy.delays(), || {
        let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
        let fut = operation();
        async move {
            match fut.await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = operation_name, attempt, "Succeeded after retry");
                    }
                    Ok(value)
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Transient error, will retry"
                    );
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %e,
                        "Giving up"
                    );
                    Err(RetryError::Permanent(e))
                }
            }
        }
    })
    .await
}
