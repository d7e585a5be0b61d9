//! Timeout error types.

/// A bounded polling loop gave up before the remote task finished.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display(
    "Timeout Error: {} did not finish after {} attempts at line {} in {}",
    operation,
    attempts,
    line,
    file
)]
pub struct TimeoutError {
    /// What was being waited on
    pub operation: String,
    /// How many polls were made
    pub attempts: u32,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl TimeoutError {
    /// Create a new TimeoutError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use novelweave_error::TimeoutError;
    ///
    /// let err = TimeoutError::new("image task abc", 60);
    /// assert_eq!(err.attempts, 60);
    /// ```
    #[track_caller]
    pub fn new(operation: impl Into<String>, attempts: u32) -> Self {
        let location = std::panic::Location::caller();
        Self {
            operation: operation.into(),
            attempts,
            line: location.line(),
            file: location.file(),
        }
    }
}
