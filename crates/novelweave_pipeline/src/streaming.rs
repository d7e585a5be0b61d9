//! Incremental conversion of long texts, one segment at a time.

use crate::{
    link_fragments, normalize_script, split_into_segments, FollowUpRequest, ProgressReporter,
    ScriptPipeline,
};
use novelweave_core::{Choice, GalgameScript, ScriptChunk, SegmentStatus, StoryNode};
use novelweave_error::{
    MalformedOutputError, MalformedOutputErrorKind, NovelweaveError, NovelweaveResult,
    PipelineError, PipelineErrorKind,
};
use novelweave_interface::CompletionProvider;
use novelweave_rate_limit::NovelweaveConfig;
use std::collections::HashSet;
use std::sync::Arc;

/// A streaming run that stopped early.
///
/// `partial` holds the normalized script of every segment that completed,
/// or `None` when the first segment failed. Chunks already published stay
/// valid.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Conversion stopped: {}", error)]
pub struct PartialScriptError {
    /// What stopped the run
    #[error(source)]
    pub error: NovelweaveError,
    /// Script built before the failure
    #[error(not(source))]
    pub partial: Option<GalgameScript>,
}

impl PartialScriptError {
    /// Error without any partial result.
    pub fn without_partial(error: NovelweaveError) -> Self {
        Self {
            error,
            partial: None,
        }
    }
}

impl From<NovelweaveError> for PartialScriptError {
    fn from(error: NovelweaveError) -> Self {
        Self::without_partial(error)
    }
}

/// Converts long texts segment by segment.
///
/// The first segment runs the full [`ScriptPipeline`] and fixes the rosters.
/// Every later segment gets one follow-up call seeded with those rosters and
/// the last emitted line, and the previous tail is relinked into the new
/// nodes. Segments are processed strictly in order.
pub struct StreamingOrchestrator<P> {
    pipeline: ScriptPipeline<P>,
}

impl<P: CompletionProvider> StreamingOrchestrator<P> {
    /// Create an orchestrator sharing `provider` between all calls.
    pub fn new(provider: Arc<P>, config: &NovelweaveConfig) -> Self {
        Self {
            pipeline: ScriptPipeline::new(provider, config),
        }
    }

    /// The single-shot pipeline used for the first segment.
    pub fn pipeline(&self) -> &ScriptPipeline<P> {
        &self.pipeline
    }

    /// Convert `text`, publishing segment progress and chunks as they complete.
    ///
    /// # Errors
    ///
    /// Stops at the first failing segment, publishes an error status for it
    /// and returns what was built so far in [`PartialScriptError`].
    #[tracing::instrument(skip_all, fields(text_chars = text.chars().count(), segments = tracing::field::Empty))]
    pub async fn run(
        &self,
        text: &str,
        progress: &ProgressReporter,
    ) -> Result<GalgameScript, PartialScriptError> {
        let segments = split_into_segments(text);
        let total = segments.len();
        tracing::Span::current().record("segments", total);

        let mut script: Option<GalgameScript> = None;

        for (index, segment) in segments.iter().enumerate() {
            let number = index + 1;
            progress.segment(number, total, SegmentStatus::Loading);

            let outcome = if index == 0 {
                self.pipeline.run(segment, progress).await.map(|base| {
                    progress.chunk(ScriptChunk::Initial(base.clone()));
                    script = Some(base);
                })
            } else {
                match script.as_mut() {
                    Some(base) => self
                        .append_segment(base, segment, number)
                        .await
                        .map(|nodes| progress.chunk(ScriptChunk::Nodes(nodes))),
                    None => Err(PipelineError::new(PipelineErrorKind::MissingBaseScript(number)).into()),
                }
            };

            if let Err(error) = outcome {
                progress.segment(number, total, SegmentStatus::Error);
                tracing::error!(segment = number, total, error = %error, "Segment failed; stopping");
                return Err(PartialScriptError {
                    error,
                    partial: script,
                });
            }

            progress.segment(number, total, SegmentStatus::Complete);
            tracing::info!(segment = number, total, "Segment complete");
        }

        match script {
            Some(script) => Ok(script),
            None => Err(NovelweaveError::from(PipelineError::new(PipelineErrorKind::EmptyInput)).into()),
        }
    }

    /// Generate nodes for one later segment and splice them onto `base`.
    ///
    /// Nothing in `base` changes unless the call succeeds. Returns the new
    /// nodes as they appear in `base`.
    #[tracing::instrument(skip(self, base, segment), fields(existing_nodes = base.nodes.len()))]
    async fn append_segment(
        &self,
        base: &mut GalgameScript,
        segment: &str,
        number: usize,
    ) -> NovelweaveResult<Vec<StoryNode>> {
        let last_text = base
            .last_node()
            .map(|n| n.text.clone())
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::MissingBaseScript(number)))?;

        let fragments = self.pipeline.fragments();
        let drafts = fragments
            .generate_follow_up(&FollowUpRequest {
                segment_text: segment,
                characters: &base.characters,
                scenes: &base.scenes,
                last_node_text: &last_text,
                first_node_number: base.nodes.len() + 1,
            })
            .await?;

        let reserved: HashSet<String> = base.nodes.iter().map(|n| n.id.clone()).collect();
        let nodes = link_fragments(vec![drafts], &reserved);
        let Some(first_id) = nodes.first().map(|n| n.id.clone()) else {
            return Err(MalformedOutputError::new(MalformedOutputErrorKind::NoNodes).into());
        };

        let label = fragments.continue_label();
        if let Some(tail) = base.nodes.last_mut() {
            relink_tail(tail, &first_id, label);
        }

        let start = base.nodes.len();
        base.nodes.extend(nodes);
        let report = normalize_script(base, label)?;
        tracing::debug!(added = base.nodes.len() - start, repairs = %report, "Segment spliced");

        Ok(base.nodes[start..].to_vec())
    }
}

/// Point the old tail at the first node of the next segment.
///
/// A lone self-loop is rewritten and a tail without choices gets a
/// continuation. Any other tail is left alone.
fn relink_tail(tail: &mut StoryNode, first_id: &str, continue_label: &str) {
    match tail.choices.as_mut_slice() {
        [only] if only.next_node_id == tail.id => {
            only.next_node_id = first_id.to_string();
        }
        [] => tail.choices.push(Choice::forward(continue_label, first_id)),
        _ => return,
    }
    tail.is_ending = false;
    tracing::debug!(tail = %tail.id, next = first_id, "Relinked segment tail");
}
