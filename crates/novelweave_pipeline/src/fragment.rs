//! Fragment and follow-up node generation.

use crate::call::{build_request, complete_json};
use crate::prompts::{
    follow_up_system_instruction, follow_up_user_content, fragment_system_instruction,
    fragment_user_content,
};
use crate::{normalize_follow_up, normalize_fragment};
use novelweave_core::{Character, DraftNode, Scene, StoryBeat};
use novelweave_error::NovelweaveResult;
use novelweave_interface::CompletionProvider;
use novelweave_rate_limit::{GenerationParams, NovelweaveConfig, RetryPolicy};

/// Input of one fragment call.
#[derive(Debug, Clone, Copy)]
pub struct FragmentRequest<'a> {
    /// Source text the beats were taken from
    pub story_text: &'a str,
    /// Character roster
    pub characters: &'a [Character],
    /// Scene roster; node scene ids must come from here
    pub scenes: &'a [Scene],
    /// Beats to expand
    pub beats: &'a [StoryBeat],
    /// Text of the previous fragment's last node
    pub previous_context: Option<&'a str>,
}

/// Input of one streaming follow-up call.
#[derive(Debug, Clone, Copy)]
pub struct FollowUpRequest<'a> {
    /// Segment to convert
    pub segment_text: &'a str,
    /// Accumulated character roster
    pub characters: &'a [Character],
    /// Accumulated scene roster
    pub scenes: &'a [Scene],
    /// Text of the last node emitted so far
    pub last_node_text: &'a str,
    /// Suggested number of the first new `node_N` id
    pub first_node_number: usize,
}

/// Expands beats, or whole segments, into draft nodes.
pub struct FragmentGenerator<P> {
    provider: P,
    fragment: GenerationParams,
    follow_up: GenerationParams,
    retry: RetryPolicy,
    language: String,
    continue_label: String,
}

impl<P: CompletionProvider> FragmentGenerator<P> {
    /// Create a generator using the fragment and follow-up settings of `config`.
    pub fn new(provider: P, config: &NovelweaveConfig) -> Self {
        Self {
            provider,
            fragment: config.generation.fragment.clone(),
            follow_up: config.generation.follow_up.clone(),
            retry: RetryPolicy::from(&config.retry),
            language: config.generation.language.clone(),
            continue_label: config.generation.continue_label.clone(),
        }
    }

    /// Label of synthesized continuation choices.
    pub fn continue_label(&self) -> &str {
        &self.continue_label
    }

    /// Generate the nodes for one batch of beats.
    ///
    /// Every node that is not an ending carries at least one choice; the
    /// last one points at the end of the fragment.
    ///
    /// # Errors
    ///
    /// Returns a provider error once retries are exhausted, or a
    /// malformed-output error if the response is not a node list.
    #[tracing::instrument(
        skip(self, req),
        fields(
            beats = %req.beats.iter().map(|b| b.id.as_str()).collect::<Vec<_>>().join(","),
            has_context = req.previous_context.is_some(),
        )
    )]
    pub async fn generate(&self, req: &FragmentRequest<'_>) -> NovelweaveResult<Vec<DraftNode>> {
        let request = build_request(
            fragment_system_instruction(
                req.characters,
                req.scenes,
                req.beats,
                req.previous_context,
                &self.language,
                &self.continue_label,
            ),
            fragment_user_content(req.story_text),
            &self.fragment,
        )?;
        let value = complete_json(&self.provider, &self.retry, "fragment", &request).await?;
        let nodes = normalize_fragment(&value, &self.continue_label)?;

        tracing::debug!(nodes = nodes.len(), "Fragment generated");
        Ok(nodes)
    }

    /// Generate the next nodes of a streaming run from one segment.
    ///
    /// The last node is left without choices so the caller can link it to
    /// the following segment.
    ///
    /// # Errors
    ///
    /// Returns a provider error once retries are exhausted, or a
    /// malformed-output error if the response has no node list.
    #[tracing::instrument(
        skip(self, req),
        fields(
            segment_chars = req.segment_text.chars().count(),
            first_node_number = req.first_node_number,
        )
    )]
    pub async fn generate_follow_up(
        &self,
        req: &FollowUpRequest<'_>,
    ) -> NovelweaveResult<Vec<DraftNode>> {
        let request = build_request(
            follow_up_system_instruction(
                req.characters,
                req.scenes,
                req.last_node_text,
                req.first_node_number,
                &self.language,
                &self.continue_label,
            ),
            follow_up_user_content(req.segment_text),
            &self.follow_up,
        )?;
        let value = complete_json(&self.provider, &self.retry, "follow_up", &request).await?;
        let nodes = normalize_follow_up(&value, &self.continue_label)?;

        tracing::debug!(nodes = nodes.len(), "Follow-up nodes generated");
        Ok(nodes)
    }
}
