//! Errors serializing finished scripts.

/// A script or validation report could not be rendered as JSON.
///
/// Model output that fails to parse is a [`crate::MalformedOutputError`];
/// this type only covers artifacts novelweave writes itself.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error: {} at line {} in {}", message, line, file)]
pub struct JsonError {
    /// Serializer message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// Record a serialization failure at the caller's location.
    ///
    /// ```
    /// use novelweave_error::{JsonError, NovelweaveError, NovelweaveErrorKind};
    ///
    /// let err: NovelweaveError = JsonError::new("script nodes are not serializable").into();
    /// assert!(matches!(err.kind(), NovelweaveErrorKind::Json(e) if e.message.starts_with("script")));
    /// assert!(!err.is_config());
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
