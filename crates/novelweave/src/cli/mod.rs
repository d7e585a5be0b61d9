//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the novelweave binary.

mod commands;
mod convert;
mod files;
mod segment;
mod validate;

pub use commands::{Cli, Commands};
pub use convert::{run_convert, ConvertOptions};
pub use segment::run_segment;
pub use validate::run_validate;
