//! Core data types for the novelweave script generation pipeline.
//!
//! This crate holds the script model shared by every stage: the final
//! [`GalgameScript`] graph, the intermediate [`StoryOutline`], the draft node
//! types carrying unresolved [`NodeLink`] references, the provider request
//! types, and the progress events published while a conversion runs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod image;
mod link;
mod outline;
mod progress;
mod request;
mod script;
mod telemetry;

pub use image::{ImageStyle, ImageTaskStatus};
pub use link::{DraftChoice, DraftNode, NodeLink, END_OF_FRAGMENT, NEXT_SENTINELS};
pub use outline::{StoryBeat, StoryOutline};
pub use progress::{
    AnalysisPhase, AnalysisProgress, PipelineEvent, ScriptChunk, SegmentProgress, SegmentStatus,
};
pub use request::{CompletionRequest, CompletionRequestBuilder, CompletionRequestBuilderError};
pub use script::{Character, Choice, GalgameScript, Scene, StoryNode, VisualKind, VisualSpec};
pub use telemetry::{init_telemetry, shutdown_telemetry};
