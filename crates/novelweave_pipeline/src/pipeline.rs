//! Single-shot conversion: outline, fragments, assembly.

use crate::{FragmentGenerator, FragmentRequest, OutlineGenerator, ProgressReporter, ScriptAssembler};
use novelweave_core::{AnalysisPhase, DraftNode, GalgameScript, StoryBeat, StoryOutline};
use novelweave_error::{NovelweaveResult, PipelineError, PipelineErrorKind};
use novelweave_interface::CompletionProvider;
use novelweave_rate_limit::NovelweaveConfig;
use std::sync::Arc;

/// Converts one piece of text into a script.
///
/// Fragments are generated strictly one after another; each sees the last
/// line of the previous one as context.
pub struct ScriptPipeline<P> {
    outline: OutlineGenerator<Arc<P>>,
    fragments: FragmentGenerator<Arc<P>>,
    assembler: ScriptAssembler,
    beats_per_batch: usize,
}

impl<P: CompletionProvider> ScriptPipeline<P> {
    /// Create a pipeline sharing `provider` between all stages.
    pub fn new(provider: Arc<P>, config: &NovelweaveConfig) -> Self {
        Self {
            outline: OutlineGenerator::new(provider.clone(), config),
            fragments: FragmentGenerator::new(provider, config),
            assembler: ScriptAssembler::new(config.generation.continue_label.clone()),
            beats_per_batch: config.generation.beats_per_batch.max(1),
        }
    }

    /// The fragment generator, shared with the streaming orchestrator.
    pub fn fragments(&self) -> &FragmentGenerator<Arc<P>> {
        &self.fragments
    }

    /// The assembler used for the final script.
    pub fn assembler(&self) -> &ScriptAssembler {
        &self.assembler
    }

    /// Run outline, fragment and assembly stages over `text`.
    ///
    /// A fragment that fails for any reason but configuration is logged and
    /// skipped; the remaining fragments are still assembled.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is empty, the outline call fails, a
    /// configuration error occurs, or no fragment produced a node.
    #[tracing::instrument(skip_all, fields(text_chars = text.chars().count()))]
    pub async fn run(&self, text: &str, progress: &ProgressReporter) -> NovelweaveResult<GalgameScript> {
        if text.trim().is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::EmptyInput).into());
        }

        progress.analysis(AnalysisPhase::Outline, 0, 1, "Analyzing story structure");
        let outline = self.outline.generate(text).await?;
        progress.analysis(AnalysisPhase::Outline, 1, 1, "Outline ready");

        let beats = beats_or_synopsis(&outline);
        let batches: Vec<&[StoryBeat]> = beats.chunks(self.beats_per_batch).collect();
        let total = batches.len();
        tracing::info!(beats = beats.len(), batches = total, "Generating fragments");

        let mut fragments: Vec<Vec<DraftNode>> = Vec::with_capacity(total);
        for (index, batch) in batches.into_iter().enumerate() {
            progress.analysis(
                AnalysisPhase::Chunks,
                index,
                total,
                format!("Generating scenes {}/{}", index + 1, total),
            );

            let previous_context = fragments
                .iter()
                .rev()
                .find_map(|f| f.last())
                .map(|node| node.text.as_str());
            let request = FragmentRequest {
                story_text: text,
                characters: &outline.characters,
                scenes: &outline.scenes,
                beats: batch,
                previous_context,
            };

            match self.fragments.generate(&request).await {
                Ok(nodes) => {
                    if nodes.is_empty() {
                        tracing::warn!(batch = index, "Fragment came back empty");
                    }
                    fragments.push(nodes);
                }
                Err(e) if e.is_config() => return Err(e),
                Err(e) => {
                    tracing::warn!(batch = index, error = %e, "Dropping failed fragment");
                    fragments.push(Vec::new());
                }
            }
        }
        progress.analysis(AnalysisPhase::Chunks, total, total, "Assembling script");

        self.assembler.assemble(&outline, fragments)
    }
}

/// Beats of `outline`, or one beat covering the synopsis when there are none.
fn beats_or_synopsis(outline: &StoryOutline) -> Vec<StoryBeat> {
    if !outline.beats.is_empty() {
        return outline.beats.clone();
    }
    tracing::warn!("Outline has no beats; adapting the whole text as one beat");
    let summary = if outline.synopsis.is_empty() {
        "Adapt the entire text in order.".to_string()
    } else {
        outline.synopsis.clone()
    };
    vec![StoryBeat {
        id: "1".to_string(),
        summary,
        location_id: outline.scenes.first().map(|s| s.id.clone()),
        required_characters: outline.characters.iter().map(|c| c.id.clone()).collect(),
    }]
}
