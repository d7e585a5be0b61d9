//! Prose to branching visual-novel scripts.
//!
//! This crate turns a piece of fiction into a [`GalgameScript`]: a graph of
//! dialogue and narration nodes linked by player choices, plus the
//! character and scene rosters they reference.
//!
//! # Stages
//!
//! - **Segmenter**: long texts are cut into segments at paragraph or
//!   sentence boundaries ([`split_into_segments`]).
//! - **Outline**: one call extracts title, synopsis, beats, characters and
//!   scenes ([`OutlineGenerator`]).
//! - **Fragments**: beats are expanded into nodes a few at a time, each call
//!   seeing the end of the previous one ([`FragmentGenerator`]).
//! - **Assembly**: fragments are linked and repaired so every choice
//!   resolves and every path ends ([`ScriptAssembler`]).
//! - **Streaming**: long texts are converted segment by segment, publishing
//!   partial scripts as they complete ([`StreamingOrchestrator`]).
//! - **Assets**: optional image generation for scenes and node visuals
//!   ([`AssetBackfill`]).
//!
//! [`Converter`] wires these together and [`ProgressReporter`] carries
//! progress events out of every stage.
//!
//! # Example
//!
//! ```rust,ignore
//! use novelweave_models::DashScopeClient;
//! use novelweave_pipeline::{Converter, ProgressReporter};
//! use novelweave_rate_limit::NovelweaveConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NovelweaveConfig::load()?;
//! let client = Arc::new(DashScopeClient::from_env(&config)?);
//! let (progress, mut events) = ProgressReporter::channel();
//!
//! tokio::spawn(async move {
//!     while let Some(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//! });
//!
//! let script = Converter::new(client, &config)
//!     .convert(&std::fs::read_to_string("novel.txt")?, &progress)
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&script)?);
//! # Ok(())
//! # }
//! ```
//!
//! [`GalgameScript`]: novelweave_core::GalgameScript

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembler;
mod assets;
mod call;
mod convert;
mod extraction;
mod fragment;
mod linker;
mod normalize;
mod outline;
mod pipeline;
mod progress;
pub mod prompts;
mod segmenter;
mod streaming;

pub use assembler::ScriptAssembler;
pub use assets::{AssetBackfill, BackfillReport};
pub use convert::{ConversionMode, Converter};
pub use extraction::{extract_json, looks_truncated, parse_json_value, parse_response};
pub use fragment::{FollowUpRequest, FragmentGenerator, FragmentRequest};
pub use linker::link_fragments;
pub use normalize::{
    is_narration, normalize_beats, normalize_characters, normalize_follow_up,
    normalize_fragment, normalize_outline, normalize_scenes, normalize_script,
    normalize_script_value, NormalizationReport, UNTITLED_OUTLINE,
};
pub use outline::OutlineGenerator;
pub use pipeline::ScriptPipeline;
pub use progress::ProgressReporter;
pub use segmenter::{
    should_use_streaming, split_into_segments, SEGMENT_SIZE, SENTENCE_TERMINATORS,
    STORY_SEGMENT_THRESHOLD,
};
pub use streaming::{PartialScriptError, StreamingOrchestrator};
