//! Progress events published while a conversion runs.

use crate::{GalgameScript, StoryNode};
use serde::{Deserialize, Serialize};

/// Stage of the single-shot pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisPhase {
    /// Outline call
    Outline,
    /// Fragment calls
    Chunks,
    /// Image back-fill
    Assets,
}

/// Progress within one phase.
///
/// # Examples
///
/// ```
/// use novelweave_core::{AnalysisPhase, AnalysisProgress};
///
/// let progress = AnalysisProgress::new(AnalysisPhase::Chunks, 1, 2, "batch 1");
/// assert_eq!(progress.percentage(), 40.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisProgress {
    /// Current phase
    pub phase: AnalysisPhase,
    /// Completed units
    pub current: usize,
    /// Total units
    pub total: usize,
    /// Human-readable status
    pub message: String,
}

impl AnalysisProgress {
    /// Build a progress update.
    pub fn new(
        phase: AnalysisPhase,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            message: message.into(),
        }
    }

    /// Overall completion in percent.
    ///
    /// Outline spans 10..20, chunks 20..60 and assets 60..100.
    pub fn percentage(&self) -> f64 {
        let fraction = if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64).min(1.0)
        };
        match self.phase {
            AnalysisPhase::Outline => 10.0 + fraction * 10.0,
            AnalysisPhase::Chunks => 20.0 + fraction * 40.0,
            AnalysisPhase::Assets => 60.0 + fraction * 40.0,
        }
    }
}

/// Status of one streaming segment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SegmentStatus {
    /// Request in flight
    Loading,
    /// Nodes received and linked
    Complete,
    /// Segment failed, stream halted
    Error,
}

/// Coarse streaming progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentProgress {
    /// One-based segment index
    pub current_segment: usize,
    /// Number of segments
    pub total_segments: usize,
    /// Where the segment is
    pub status: SegmentStatus,
}

/// Partial result emitted during streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptChunk {
    /// Full script of the first segment
    Initial(GalgameScript),
    /// Nodes appended by a follow-up segment
    Nodes(Vec<StoryNode>),
}

/// Everything a presentation layer can observe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
pub enum PipelineEvent {
    /// Single-shot phase progress
    Analysis(AnalysisProgress),
    /// Streaming segment progress
    Segment(SegmentProgress),
    /// Incremental script data
    Chunk(ScriptChunk),
}
