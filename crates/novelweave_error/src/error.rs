//! Top-level error wrapper types.

use crate::{
    ConfigError, FileError, JsonError, MalformedOutputError, PipelineError, ProviderError,
    RetryableError, TimeoutError,
};

/// Every failure the pipeline can surface.
///
/// # Examples
///
/// ```
/// use novelweave_error::{NovelweaveError, ConfigError};
///
/// let err: NovelweaveError = ConfigError::new("Missing key").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum NovelweaveErrorKind {
    /// Configuration or credential error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Remote provider error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Model output could not be parsed
    #[from(MalformedOutputError)]
    MalformedOutput(MalformedOutputError),
    /// Polling gave up
    #[from(TimeoutError)]
    Timeout(TimeoutError),
    /// Orchestration error
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// JSON serialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Input or output file error
    #[from(FileError)]
    File(FileError),
}

/// Novelweave error with kind discrimination.
///
/// # Examples
///
/// ```
/// use novelweave_error::{NovelweaveError, NovelweaveResult, ConfigError};
///
/// fn might_fail() -> NovelweaveResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Novelweave Error: {}", _0)]
pub struct NovelweaveError(Box<NovelweaveErrorKind>);

impl NovelweaveError {
    /// Create a new error from a kind.
    pub fn new(kind: NovelweaveErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &NovelweaveErrorKind {
        &self.0
    }

    /// True for missing credentials and configuration problems.
    pub fn is_config(&self) -> bool {
        matches!(self.kind(), NovelweaveErrorKind::Config(_))
    }

    /// The single message shown to end users.
    ///
    /// Diagnostics (HTTP status, parse snippets) belong in operator logs, so
    /// every failure collapses to one sentence here.
    ///
    /// ```
    /// use novelweave_error::{NovelweaveError, PipelineError, PipelineErrorKind};
    ///
    /// let err: NovelweaveError = PipelineError::new(PipelineErrorKind::EmptyInput).into();
    /// assert!(!err.user_message().contains("line"));
    /// ```
    pub fn user_message(&self) -> &'static str {
        "Story conversion failed. Please try again."
    }
}

impl RetryableError for NovelweaveError {
    fn is_retryable(&self) -> bool {
        match self.kind() {
            NovelweaveErrorKind::Provider(e) => e.is_retryable(),
            _ => false,
        }
    }
}

// Generic From implementation for any type that converts to NovelweaveErrorKind
impl<T> From<T> for NovelweaveError
where
    T: Into<NovelweaveErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for novelweave operations.
///
/// # Examples
///
/// ```
/// use novelweave_error::{NovelweaveResult, ProviderError, ProviderErrorKind};
///
/// fn fetch() -> NovelweaveResult<String> {
///     Err(ProviderError::new(ProviderErrorKind::EmptyResponse))?
/// }
/// ```
pub type NovelweaveResult<T> = std::result::Result<T, NovelweaveError>;
