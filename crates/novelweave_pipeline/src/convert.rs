//! One entry point for whole conversions.

use crate::{
    should_use_streaming, AssetBackfill, PartialScriptError, ProgressReporter, StreamingOrchestrator,
};
use novelweave_core::GalgameScript;
use novelweave_interface::{CompletionProvider, ImageProvider};
use novelweave_rate_limit::NovelweaveConfig;
use std::sync::Arc;

/// How [`Converter::convert`] drives the text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum ConversionMode {
    /// Stream when the text is longer than the segment threshold
    #[default]
    Auto,
    /// Always segment and stream
    Streaming,
    /// Always run one outline over the whole text
    SingleShot,
}

/// Converts text to a script, then optionally fills in images.
///
/// # Example
///
/// ```no_run
/// use novelweave_pipeline::{Converter, ProgressReporter};
/// # use novelweave_interface::CompletionProvider;
/// # use novelweave_rate_limit::NovelweaveConfig;
/// # use std::sync::Arc;
/// # async fn example<P: CompletionProvider>(provider: Arc<P>) -> Result<(), Box<dyn std::error::Error>> {
/// let config = NovelweaveConfig::load()?;
/// let converter = Converter::new(provider, &config);
/// let script = converter.convert("雨夜，凯尔在巷子里等米拉。", &ProgressReporter::disabled()).await?;
/// println!("{} nodes", script.nodes.len());
/// # Ok(())
/// # }
/// ```
pub struct Converter<P> {
    streaming: StreamingOrchestrator<P>,
    assets: Option<AssetBackfill<Arc<dyn ImageProvider>>>,
    mode: ConversionMode,
}

impl<P: CompletionProvider> Converter<P> {
    /// Create a converter without image back-fill.
    pub fn new(provider: Arc<P>, config: &NovelweaveConfig) -> Self {
        Self {
            streaming: StreamingOrchestrator::new(provider, config),
            assets: None,
            mode: ConversionMode::default(),
        }
    }

    /// Back-fill images with `images` if `config` enables assets.
    pub fn with_images(mut self, images: Arc<dyn ImageProvider>, config: &NovelweaveConfig) -> Self {
        if config.assets.enabled {
            self.assets = Some(AssetBackfill::new(images, config));
        } else {
            tracing::debug!("Asset back-fill disabled in configuration");
        }
        self
    }

    /// Use an explicit image back-fill pass regardless of configuration.
    pub fn with_backfill(mut self, backfill: AssetBackfill<Arc<dyn ImageProvider>>) -> Self {
        self.assets = Some(backfill);
        self
    }

    /// Force streaming or single-shot conversion.
    pub fn with_mode(mut self, mode: ConversionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether `text` would be streamed under the current mode.
    pub fn streams(&self, text: &str) -> bool {
        match self.mode {
            ConversionMode::Auto => should_use_streaming(text),
            ConversionMode::Streaming => true,
            ConversionMode::SingleShot => false,
        }
    }

    /// Convert `text` and back-fill images when configured.
    ///
    /// Image failures only leave placeholders; they never fail the call.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error. In streaming mode the error
    /// carries the segments completed before it.
    #[tracing::instrument(skip_all, fields(mode = %self.mode, streaming = tracing::field::Empty))]
    pub async fn convert(
        &self,
        text: &str,
        progress: &ProgressReporter,
    ) -> Result<GalgameScript, PartialScriptError> {
        let streaming = self.streams(text);
        tracing::Span::current().record("streaming", streaming);

        let mut script = if streaming {
            self.streaming.run(text, progress).await?
        } else {
            self.streaming.pipeline().run(text, progress).await?
        };

        if let Some(assets) = &self.assets {
            let report = assets.run(&mut script, progress).await;
            if !report.failed().is_empty() {
                tracing::warn!(failed = ?report.failed(), "Some images are missing");
            }
        }

        tracing::info!(nodes = script.nodes.len(), "Conversion complete");
        Ok(script)
    }
}
