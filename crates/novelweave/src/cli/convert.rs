//! Conversion command handler.

use super::files::{read_text, write_json};
use novelweave::{
    dashscope_provider, ConversionMode, Converter, ImageProvider, NovelweaveConfig,
    NovelweaveResult, PipelineEvent, ProgressReporter, ScriptChunk,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Options of one `convert` invocation.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Novel text to convert
    pub input: PathBuf,
    /// Destination of the script JSON; stdout when absent
    pub output: Option<PathBuf>,
    /// Streaming or single-shot
    pub mode: ConversionMode,
    /// Force image back-fill on
    pub assets: bool,
    /// Quota tier
    pub tier: Option<String>,
}

/// Convert the input file and write the script.
///
/// If streaming stops part way, the completed part is still written before
/// the error is returned.
#[tracing::instrument(skip_all, fields(input = %options.input.display(), mode = %options.mode))]
pub async fn run_convert(options: ConvertOptions, mut config: NovelweaveConfig) -> NovelweaveResult<()> {
    let text = read_text(&options.input)?;
    if options.assets {
        config.assets.enabled = true;
    }

    let provider = dashscope_provider(&config, options.tier.as_deref())?;
    let images: Arc<dyn ImageProvider> = provider.clone();
    let converter = Converter::new(provider, &config)
        .with_images(images, &config)
        .with_mode(options.mode);

    tracing::info!(
        chars = text.chars().count(),
        streaming = converter.streams(&text),
        assets = config.assets.enabled,
        "Starting conversion"
    );

    let (progress, events) = ProgressReporter::channel();
    let printer = tokio::spawn(print_progress(events));
    let result = converter.convert(&text, &progress).await;
    drop(progress);
    if let Err(e) = printer.await {
        tracing::debug!(error = %e, "Progress printer ended abnormally");
    }

    match result {
        Ok(script) => write_json(&script, options.output.as_deref()),
        Err(partial) => {
            if let Some(script) = &partial.partial {
                tracing::warn!(nodes = script.nodes.len(), "Writing partial script");
                write_json(script, options.output.as_deref())?;
            }
            Err(partial.error)
        }
    }
}

/// Print progress events to stderr until the channel closes.
async fn print_progress(mut events: UnboundedReceiver<PipelineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::Analysis(progress) => {
                eprintln!("[{:>5.1}%] {}", progress.percentage(), progress.message);
            }
            PipelineEvent::Segment(segment) => {
                eprintln!(
                    "Segment {}/{}: {}",
                    segment.current_segment, segment.total_segments, segment.status
                );
            }
            PipelineEvent::Chunk(ScriptChunk::Initial(script)) => {
                eprintln!("  \"{}\": {} nodes", script.title, script.nodes.len());
            }
            PipelineEvent::Chunk(ScriptChunk::Nodes(nodes)) => {
                eprintln!("  +{} nodes", nodes.len());
            }
        }
    }
}
