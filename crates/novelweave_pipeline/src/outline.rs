//! Whole-story outline generation.

use crate::call::{build_request, complete_json};
use crate::normalize_outline;
use crate::prompts::{outline_system_instruction, outline_user_content};
use novelweave_core::StoryOutline;
use novelweave_error::NovelweaveResult;
use novelweave_interface::CompletionProvider;
use novelweave_rate_limit::{GenerationParams, NovelweaveConfig, RetryPolicy};

/// Produces the macro outline of a story in one completion call.
pub struct OutlineGenerator<P> {
    provider: P,
    params: GenerationParams,
    retry: RetryPolicy,
    language: String,
}

impl<P: CompletionProvider> OutlineGenerator<P> {
    /// Create a generator using the outline settings of `config`.
    pub fn new(provider: P, config: &NovelweaveConfig) -> Self {
        Self {
            provider,
            params: config.generation.outline.clone(),
            retry: RetryPolicy::from(&config.retry),
            language: config.generation.language.clone(),
        }
    }

    /// Generate and normalize the outline of `story_text`.
    ///
    /// Missing rosters and beats come back empty instead of failing.
    ///
    /// # Errors
    ///
    /// Returns a provider error once retries are exhausted, or a
    /// malformed-output error if the response holds no usable JSON.
    #[tracing::instrument(
        skip(self, story_text),
        fields(
            provider = self.provider.provider_name(),
            text_chars = story_text.chars().count(),
        )
    )]
    pub async fn generate(&self, story_text: &str) -> NovelweaveResult<StoryOutline> {
        let request = build_request(
            outline_system_instruction(&self.language),
            outline_user_content(story_text),
            &self.params,
        )?;
        let value = complete_json(&self.provider, &self.retry, "outline", &request).await?;
        let outline = normalize_outline(&value)?;

        tracing::info!(
            title = %outline.title,
            beats = outline.beats.len(),
            characters = outline.characters.len(),
            scenes = outline.scenes.len(),
            "Outline generated"
        );
        Ok(outline)
    }
}
