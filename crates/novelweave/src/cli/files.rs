//! Reading inputs and writing results.

use novelweave::{FileError, FileErrorKind, JsonError, NovelweaveResult};
use serde::Serialize;
use std::path::Path;

/// Read a UTF-8 text file.
pub fn read_text(path: &Path) -> NovelweaveResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        FileError::new(FileErrorKind::Read(format!("{}: {}", path.display(), e))).into()
    })
}

/// Write `value` as pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> NovelweaveResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| JsonError::new(e.to_string()))?;
    match path {
        Some(path) => {
            std::fs::write(path, json).map_err(|e| {
                FileError::new(FileErrorKind::Write(format!("{}: {}", path.display(), e)))
            })?;
            tracing::info!(path = %path.display(), "Script written");
        }
        None => println!("{}", json),
    }
    Ok(())
}
