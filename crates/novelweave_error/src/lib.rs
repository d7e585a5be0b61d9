//! Error types for the novelweave pipeline.
//!
//! This crate provides the error taxonomy shared by every novelweave crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! The categories mirror how the pipeline treats failures:
//! - [`ConfigError`]: missing credentials or bad configuration, fatal
//! - [`ProviderError`]: transport or status failures, retried with backoff
//! - [`MalformedOutputError`]: model output that cannot be parsed, not retried
//! - [`TimeoutError`]: asset polling that never completed
//! - [`PipelineError`]: orchestration failures
//! - [`FileError`]: novel inputs or script outputs that cannot be read or written
//!
//! # Examples
//!
//! ```
//! use novelweave_error::{NovelweaveResult, ConfigError};
//!
//! fn load_key() -> NovelweaveResult<String> {
//!     Err(ConfigError::new("DASHSCOPE_API_KEY is not set"))?
//! }
//!
//! match load_key() {
//!     Ok(key) => println!("Got: {}", key),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod file;
mod json;
mod malformed;
mod pipeline;
mod provider;
mod retry;
mod timeout;

pub use config::ConfigError;
pub use error::{NovelweaveError, NovelweaveErrorKind, NovelweaveResult};
pub use file::{FileError, FileErrorKind};
pub use json::JsonError;
pub use malformed::{MalformedOutputError, MalformedOutputErrorKind};
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use provider::{ProviderError, ProviderErrorKind};
pub use retry::RetryableError;
pub use timeout::TimeoutError;
