mod test_utils;

use novelweave_core::{AnalysisPhase, PipelineEvent};
use novelweave_error::{MalformedOutputErrorKind, NovelweaveErrorKind, PipelineErrorKind};
use novelweave_pipeline::{OutlineGenerator, ProgressReporter, ScriptPipeline};
use serde_json::json;
use std::sync::Arc;
use test_utils::{
    assert_playable, drain, fragment_json, outline_json, test_config, MockCompletionProvider,
    MockResponse,
};

const STORY: &str = "雨没有停。凯尔靠在小巷的墙上，等着米拉。";

#[tokio::test]
async fn test_single_shot_conversion_is_playable() -> anyhow::Result<()> {
    let provider = Arc::new(MockCompletionProvider::new([
        MockResponse::fenced(outline_json(4)),
        MockResponse::json(fragment_json("a", "alley", 3)),
        MockResponse::json(fragment_json("b", "rooftop", 2)),
    ]));
    let pipeline = ScriptPipeline::new(provider.clone(), &test_config());

    let script = pipeline.run(STORY, &ProgressReporter::disabled()).await?;

    assert_eq!(provider.call_count(), 3);
    assert_eq!(provider.remaining(), 0);
    assert_eq!(script.title, "雨夜");
    assert_eq!(script.characters.len(), 2);
    assert_eq!(script.start_node_id, "a1");
    assert_eq!(
        script.nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
        vec!["a1", "a2", "a3", "b1", "b2"]
    );
    assert_eq!(script.node("a3").unwrap().choices[0].next_node_id, "b1");
    assert_eq!(script.node("a1").unwrap().character_id, None);
    assert_eq!(script.node("a2").unwrap().character_id.as_deref(), Some("kael"));
    assert!(script.node("b2").unwrap().is_ending);
    assert_playable(&script);
    Ok(())
}

#[tokio::test]
async fn test_fragments_carry_previous_context() -> anyhow::Result<()> {
    let provider = Arc::new(MockCompletionProvider::new([
        MockResponse::json(outline_json(4)),
        MockResponse::json(fragment_json("a", "alley", 3)),
        MockResponse::json(fragment_json("b", "rooftop", 2)),
    ]));
    let pipeline = ScriptPipeline::new(provider.clone(), &test_config());
    pipeline.run(STORY, &ProgressReporter::disabled()).await?;

    let requests = provider.requests();
    assert!(requests[1].system_instruction().contains("(none, this is the opening)"));
    assert!(requests[1].system_instruction().contains("Beat 3: 第3个情节"));
    assert!(!requests[1].system_instruction().contains("Beat 4"));
    assert!(requests[2].system_instruction().contains("Previously: a的第3句。"));
    assert!(requests[2].system_instruction().contains("Beat 4: 第4个情节"));
    assert!(requests[2].user_content().contains(STORY));
    Ok(())
}

#[tokio::test]
async fn test_outline_without_scenes_is_not_an_error() -> anyhow::Result<()> {
    let mut outline = outline_json(2);
    outline.as_object_mut().unwrap().remove("scenes");
    let provider = MockCompletionProvider::new([MockResponse::json(outline)]);

    let generated = OutlineGenerator::new(provider, &test_config()).generate(STORY).await?;

    assert!(generated.scenes.is_empty());
    assert_eq!(generated.beats.len(), 2);
    assert_eq!(generated.characters.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_unknown_scenes_are_synthesized() -> anyhow::Result<()> {
    let mut outline = outline_json(1);
    outline.as_object_mut().unwrap().remove("scenes");
    let provider = Arc::new(MockCompletionProvider::new([
        MockResponse::json(outline),
        MockResponse::json(fragment_json("a", "alley", 2)),
    ]));

    let script = ScriptPipeline::new(provider, &test_config())
        .run(STORY, &ProgressReporter::disabled())
        .await?;

    assert_eq!(script.scenes.len(), 1);
    assert_playable(&script);
    Ok(())
}

#[tokio::test]
async fn test_outline_without_beats_adapts_synopsis() -> anyhow::Result<()> {
    let mut outline = outline_json(0);
    outline.as_object_mut().unwrap().remove("beats");
    let provider = Arc::new(MockCompletionProvider::new([
        MockResponse::json(outline),
        MockResponse::json(fragment_json("a", "alley", 2)),
    ]));

    let script = ScriptPipeline::new(provider.clone(), &test_config())
        .run(STORY, &ProgressReporter::disabled())
        .await?;

    assert_eq!(provider.call_count(), 2);
    assert!(provider.requests()[1]
        .system_instruction()
        .contains("Beat 1: 凯尔在雨夜把驱动器交给米拉。"));
    assert_eq!(script.nodes.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_transient_errors_are_retried() -> anyhow::Result<()> {
    let provider = Arc::new(MockCompletionProvider::new([
        MockResponse::unavailable(),
        MockResponse::json(outline_json(1)),
        MockResponse::unavailable(),
        MockResponse::unavailable(),
        MockResponse::json(fragment_json("a", "alley", 2)),
    ]));

    let script = ScriptPipeline::new(provider.clone(), &test_config())
        .run(STORY, &ProgressReporter::disabled())
        .await?;

    assert_eq!(provider.call_count(), 5);
    assert_eq!(script.nodes.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_failed_fragment_is_dropped() -> anyhow::Result<()> {
    let provider = Arc::new(MockCompletionProvider::new([
        MockResponse::json(outline_json(4)),
        MockResponse::bad_request(),
        MockResponse::json(fragment_json("b", "rooftop", 2)),
    ]));

    let script = ScriptPipeline::new(provider.clone(), &test_config())
        .run(STORY, &ProgressReporter::disabled())
        .await?;

    assert_eq!(provider.call_count(), 3);
    assert_eq!(script.start_node_id, "b1");
    assert_eq!(script.nodes.len(), 2);
    assert_playable(&script);
    Ok(())
}

#[tokio::test]
async fn test_unparseable_fragment_is_dropped() -> anyhow::Result<()> {
    let provider = Arc::new(MockCompletionProvider::new([
        MockResponse::json(outline_json(4)),
        MockResponse::json(fragment_json("a", "alley", 2)),
        MockResponse::Text("抱歉，我无法完成这个请求。".to_string()),
    ]));

    let script = ScriptPipeline::new(provider.clone(), &test_config())
        .run(STORY, &ProgressReporter::disabled())
        .await?;

    assert_eq!(provider.call_count(), 3);
    assert_eq!(script.nodes.len(), 2);
    assert!(script.node("a2").unwrap().is_ending);
    Ok(())
}

#[tokio::test]
async fn test_config_error_aborts_the_run() {
    let provider = Arc::new(MockCompletionProvider::new([
        MockResponse::json(outline_json(4)),
        MockResponse::ConfigError("DASHSCOPE_API_KEY is not set".to_string()),
        MockResponse::json(fragment_json("b", "rooftop", 2)),
    ]));

    let err = ScriptPipeline::new(provider.clone(), &test_config())
        .run(STORY, &ProgressReporter::disabled())
        .await
        .unwrap_err();

    assert!(err.is_config());
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_every_fragment_failing_is_no_nodes() {
    let provider = Arc::new(MockCompletionProvider::new([
        MockResponse::json(outline_json(1)),
        MockResponse::json(json!([])),
    ]));

    let err = ScriptPipeline::new(provider, &test_config())
        .run(STORY, &ProgressReporter::disabled())
        .await
        .unwrap_err();

    assert!(matches!(
        err.kind(),
        NovelweaveErrorKind::MalformedOutput(e) if e.kind == MalformedOutputErrorKind::NoNodes
    ));
}

#[tokio::test]
async fn test_outline_failure_propagates() {
    let provider = Arc::new(MockCompletionProvider::new([MockResponse::bad_request()]));

    let err = ScriptPipeline::new(provider.clone(), &test_config())
        .run(STORY, &ProgressReporter::disabled())
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), NovelweaveErrorKind::Provider(_)));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_blank_input_makes_no_calls() {
    let provider = Arc::new(MockCompletionProvider::new([]));

    let err = ScriptPipeline::new(provider.clone(), &test_config())
        .run(" \n\t ", &ProgressReporter::disabled())
        .await
        .unwrap_err();

    assert!(matches!(
        err.kind(),
        NovelweaveErrorKind::Pipeline(e) if e.kind == PipelineErrorKind::EmptyInput
    ));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_progress_follows_phases() -> anyhow::Result<()> {
    let provider = Arc::new(MockCompletionProvider::new([
        MockResponse::json(outline_json(4)),
        MockResponse::json(fragment_json("a", "alley", 2)),
        MockResponse::json(fragment_json("b", "rooftop", 2)),
    ]));
    let (progress, mut rx) = ProgressReporter::channel();

    ScriptPipeline::new(provider, &test_config()).run(STORY, &progress).await?;

    let steps: Vec<(AnalysisPhase, usize, usize)> = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            PipelineEvent::Analysis(p) => Some((p.phase, p.current, p.total)),
            _ => None,
        })
        .collect();
    assert_eq!(
        steps,
        vec![
            (AnalysisPhase::Outline, 0, 1),
            (AnalysisPhase::Outline, 1, 1),
            (AnalysisPhase::Chunks, 0, 2),
            (AnalysisPhase::Chunks, 1, 2),
            (AnalysisPhase::Chunks, 2, 2),
        ]
    );
    Ok(())
}
