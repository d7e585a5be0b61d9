//! Local file error types.

/// What went wrong touching a file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum FileErrorKind {
    /// Failed to read an input file
    #[display("Failed to read {}", _0)]
    Read(String),
    /// Failed to write an output file
    #[display("Failed to write {}", _0)]
    Write(String),
}

/// File I/O error with location tracking.
///
/// Covers novel text inputs and script outputs. Configuration files that
/// fail to load are reported as [`crate::ConfigError`] instead.
///
/// # Examples
///
/// ```
/// use novelweave_error::{FileError, FileErrorKind};
///
/// let err = FileError::new(FileErrorKind::Read("novel.txt: not found".to_string()));
/// assert!(format!("{}", err).contains("Failed to read novel.txt"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("File Error: {} at line {} in {}", kind, line, file)]
pub struct FileError {
    /// The kind of error that occurred
    pub kind: FileErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl FileError {
    /// Create a new file error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: FileErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
