//! Side channel for progress events.

use novelweave_core::{
    AnalysisPhase, AnalysisProgress, PipelineEvent, ScriptChunk, SegmentProgress, SegmentStatus,
};
use novelweave_error::{PipelineError, PipelineErrorKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Publishes [`PipelineEvent`]s to whoever listens.
///
/// A reporter without a sender, or whose receiver was dropped, silently
/// discards events; publishing never fails the pipeline.
///
/// # Example
///
/// ```
/// use novelweave_core::{PipelineEvent, SegmentStatus};
/// use novelweave_pipeline::ProgressReporter;
///
/// let (reporter, mut events) = ProgressReporter::channel();
/// reporter.segment(1, 3, SegmentStatus::Loading);
///
/// assert!(matches!(events.try_recv(), Ok(PipelineEvent::Segment(_))));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<UnboundedSender<PipelineEvent>>,
    closed: Arc<AtomicBool>,
}

impl ProgressReporter {
    /// Reporter publishing to `sender`.
    pub fn new(sender: UnboundedSender<PipelineEvent>) -> Self {
        Self {
            sender: Some(sender),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Reporter that discards everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Reporter plus the receiving end of its channel.
    pub fn channel() -> (Self, UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Publish one event.
    pub fn publish(&self, event: impl Into<PipelineEvent>) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(event.into()).is_err() && !self.closed.swap(true, Ordering::Relaxed) {
            let error = PipelineError::new(PipelineErrorKind::EventChannelClosed);
            tracing::debug!(%error, "Progress receiver dropped; discarding further events");
        }
    }

    /// Publish a single-shot phase update.
    pub fn analysis(&self, phase: AnalysisPhase, current: usize, total: usize, message: impl Into<String>) {
        let progress = AnalysisProgress::new(phase, current, total, message);
        tracing::trace!(%phase, current, total, percentage = progress.percentage(), "Progress");
        self.publish(progress);
    }

    /// Publish a streaming segment update. Segments count from 1.
    pub fn segment(&self, current_segment: usize, total_segments: usize, status: SegmentStatus) {
        self.publish(SegmentProgress {
            current_segment,
            total_segments,
            status,
        });
    }

    /// Publish a partial script.
    pub fn chunk(&self, chunk: ScriptChunk) {
        self.publish(chunk);
    }
}
