//! Retry classification.

/// Trait for errors that support retry logic.
///
/// The retry wrapper consults this before scheduling another attempt.
/// Transient failures (timeouts, 429, 5xx, dropped connections) return
/// true. Permanent ones (bad credentials, unparseable output) return false.
///
/// # Examples
///
/// ```
/// use novelweave_error::{ConfigError, NovelweaveError, RetryableError};
///
/// let err: NovelweaveError = ConfigError::new("no key").into();
/// assert!(!err.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;
}
