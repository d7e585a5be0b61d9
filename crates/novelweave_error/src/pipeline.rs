//! Pipeline orchestration error types.

/// Specific error conditions for pipeline orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// Input text was empty after trimming
    #[display("Input text is empty")]
    EmptyInput,
    /// Follow-up generation requested before the first segment produced a script
    #[display("No base script available for follow-up segment {}", _0)]
    MissingBaseScript(usize),
    /// Request or message builder rejected its inputs
    #[display("Failed to build request: {}", _0)]
    Builder(String),
    /// Progress event receiver went away
    #[display("Progress channel closed")]
    EventChannelClosed,
}

/// Error type for pipeline orchestration.
///
/// # Examples
///
/// ```
/// use novelweave_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::EmptyInput);
/// assert!(format!("{}", err).contains("empty"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
