//! Image back-fill for scenes and node visuals.

use crate::ProgressReporter;
use novelweave_core::{AnalysisPhase, GalgameScript, ImageStyle, ImageTaskStatus};
use novelweave_error::{NovelweaveResult, ProviderError, ProviderErrorKind, TimeoutError};
use novelweave_interface::ImageProvider;
use novelweave_rate_limit::{retry_with_backoff, NovelweaveConfig, RetryPolicy};
use serde::Serialize;
use std::time::Duration;

/// Outcome of one back-fill pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, derive_getters::Getters)]
pub struct BackfillReport {
    /// Images requested
    requested: usize,
    /// Images that came back with a URL
    succeeded: usize,
    /// Scene or node ids whose image failed
    failed: Vec<String>,
}

/// Where a generated image goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Scene(usize),
    Node(usize),
}

/// Requests an image for every scene and node visual that lacks one.
///
/// Images are generated one at a time. A failed or timed-out image leaves
/// its `image_url` unset and never fails the pass.
pub struct AssetBackfill<I> {
    provider: I,
    retry: RetryPolicy,
    poll_interval: Duration,
    max_poll_attempts: u32,
    style: ImageStyle,
}

impl<I: ImageProvider> AssetBackfill<I> {
    /// Create a back-fill pass using the asset and retry settings of `config`.
    pub fn new(provider: I, config: &NovelweaveConfig) -> Self {
        Self {
            provider,
            retry: RetryPolicy::from(&config.retry),
            poll_interval: Duration::from_millis(config.assets.poll_interval_ms),
            max_poll_attempts: config.assets.max_poll_attempts.max(1),
            style: ImageStyle::default(),
        }
    }

    /// Render in `style` instead of the default.
    pub fn with_style(mut self, style: ImageStyle) -> Self {
        self.style = style;
        self
    }

    /// Wait `interval` between task polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Submit one image task and wait for its URL.
    ///
    /// Submission goes through the retry policy; polling does not.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderErrorKind::TaskFailed`] if the task fails and a
    /// [`TimeoutError`] if it is still pending after the last poll.
    #[tracing::instrument(skip(self, prompt), fields(style = %style, task_id = tracing::field::Empty))]
    pub async fn generate_image(&self, prompt: &str, style: ImageStyle) -> NovelweaveResult<String> {
        let task_id =
            retry_with_backoff(&self.retry, "image_submit", || self.provider.submit(prompt, style))
                .await?;
        tracing::Span::current().record("task_id", task_id.as_str());

        for attempt in 1..=self.max_poll_attempts {
            tokio::time::sleep(self.poll_interval).await;
            match self.provider.poll(&task_id).await? {
                ImageTaskStatus::Pending => {
                    tracing::trace!(attempt, "Image task pending");
                }
                ImageTaskStatus::Succeeded { url } => {
                    tracing::debug!(attempt, "Image task succeeded");
                    return Ok(url);
                }
                ImageTaskStatus::Failed { message } => {
                    return Err(ProviderError::new(ProviderErrorKind::TaskFailed(message)).into());
                }
            }
        }

        Err(TimeoutError::new(format!("image task {}", task_id), self.max_poll_attempts).into())
    }

    /// Fill in missing images of `script`.
    ///
    /// Scenes are visited before node visuals, each in script order.
    #[tracing::instrument(skip_all, fields(scenes = script.scenes.len(), nodes = script.nodes.len()))]
    pub async fn run(&self, script: &mut GalgameScript, progress: &ProgressReporter) -> BackfillReport {
        let targets = pending_targets(script);
        let total = targets.len();
        let mut report = BackfillReport {
            requested: total,
            ..BackfillReport::default()
        };

        progress.analysis(AnalysisPhase::Assets, 0, total, "Generating images");

        for (index, (target, prompt)) in targets.into_iter().enumerate() {
            let label = target_id(script, target);
            match self.generate_image(&prompt, self.style).await {
                Ok(url) => {
                    set_url(script, target, url);
                    report.succeeded += 1;
                }
                Err(e) => {
                    tracing::warn!(target = %label, error = %e, "Image generation failed; leaving placeholder");
                    report.failed.push(label);
                }
            }
            progress.analysis(
                AnalysisPhase::Assets,
                index + 1,
                total,
                format!("Generated images {}/{}", index + 1, total),
            );
        }

        tracing::info!(
            requested = report.requested,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "Asset back-fill complete"
        );
        report
    }
}

/// Targets without an image and the prompt to render for each.
fn pending_targets(script: &GalgameScript) -> Vec<(Target, String)> {
    let scenes = script.scenes.iter().enumerate().filter_map(|(i, scene)| {
        if scene.image_url.is_some() {
            return None;
        }
        prompt_of(&scene.visual_prompt, &scene.description).map(|p| (Target::Scene(i), p))
    });

    let nodes = script.nodes.iter().enumerate().filter_map(|(i, node)| {
        let spec = node.visual_specs.as_ref()?;
        if spec.image_url.is_some() {
            return None;
        }
        prompt_of(&spec.visual_prompt, &spec.description).map(|p| (Target::Node(i), p))
    });

    scenes.chain(nodes).collect()
}

fn prompt_of(visual_prompt: &str, description: &str) -> Option<String> {
    [visual_prompt, description]
        .into_iter()
        .map(str::trim)
        .find(|p| !p.is_empty())
        .map(str::to_string)
}

fn target_id(script: &GalgameScript, target: Target) -> String {
    match target {
        Target::Scene(i) => script.scenes[i].id.clone(),
        Target::Node(i) => script.nodes[i].id.clone(),
    }
}

fn set_url(script: &mut GalgameScript, target: Target, url: String) {
    match target {
        Target::Scene(i) => script.scenes[i].image_url = Some(url),
        Target::Node(i) => {
            if let Some(spec) = script.nodes[i].visual_specs.as_mut() {
                spec.image_url = Some(url);
            }
        }
    }
}
