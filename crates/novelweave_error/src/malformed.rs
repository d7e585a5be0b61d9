//! Malformed model output error types.

/// Ways a model response can fail to yield the expected structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum MalformedOutputErrorKind {
    /// No JSON object or array could be located in the response
    #[display("No JSON found in response (length: {})", response_length)]
    NoJson {
        /// Length of the raw response in bytes
        response_length: usize,
    },
    /// JSON was located but failed to parse
    #[display("Invalid JSON: {} (near: {})", message, preview)]
    InvalidJson {
        /// Parser message
        message: String,
        /// Leading slice of the offending text
        preview: String,
    },
    /// JSON parsed but has the wrong top-level shape
    #[display("Unexpected response shape: {}", _0)]
    UnexpectedShape(String),
    /// No usable story nodes survived normalization
    #[display("Generated script contains no nodes")]
    NoNodes,
}

/// Malformed output error with source location tracking.
///
/// Surfaced to the caller as a "try again" condition. The same call is
/// never retried automatically.
///
/// # Examples
///
/// ```
/// use novelweave_error::{MalformedOutputError, MalformedOutputErrorKind};
///
/// let err = MalformedOutputError::new(MalformedOutputErrorKind::NoNodes);
/// assert!(format!("{}", err).contains("no nodes"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Malformed Output: {} at line {} in {}", kind, line, file)]
pub struct MalformedOutputError {
    /// The specific error condition
    pub kind: MalformedOutputErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl MalformedOutputError {
    /// Create a new MalformedOutputError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: MalformedOutputErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
