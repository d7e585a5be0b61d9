//! Novelweave - prose to branching visual-novel scripts
//!
//! Novelweave reads a piece of fiction and asks an LLM to rework it into a
//! playable galgame script: characters, scenes and a graph of narration and
//! dialogue nodes joined by player choices.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use novelweave::{dashscope_provider, load_config, Converter, ProgressReporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config(None)?;
//!     let provider = dashscope_provider(&config, None)?;
//!
//!     let text = std::fs::read_to_string("chapter1.txt")?;
//!     let script = Converter::new(provider, &config)
//!         .convert(&text, &ProgressReporter::disabled())
//!         .await?;
//!
//!     println!("{}", serde_json::to_string_pretty(&script)?);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Novelweave is organized as a workspace with focused crates:
//!
//! - `novelweave_error` - Error types
//! - `novelweave_core` - Script data model, progress events, telemetry
//! - `novelweave_interface` - Completion and image capability traits
//! - `novelweave_rate_limit` - Retry, rate limiting and configuration
//! - `novelweave_models` - DashScope client
//! - `novelweave_pipeline` - Segmentation, generation and assembly
//!
//! This crate (`novelweave`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod setup;

pub use novelweave_core::*;
pub use novelweave_error::*;
pub use novelweave_interface::*;
pub use novelweave_models::*;
pub use novelweave_pipeline::*;
pub use novelweave_rate_limit::*;

pub use setup::{dashscope_provider, load_config, DashScopeProvider};
