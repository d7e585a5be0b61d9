//! Test utilities for novelweave_pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use novelweave_core::{CompletionRequest, ImageStyle, ImageTaskStatus, PipelineEvent};
use novelweave_error::{ConfigError, NovelweaveError, NovelweaveResult, ProviderError, ProviderErrorKind};
use novelweave_interface::{CompletionProvider, ImageProvider};
use novelweave_rate_limit::NovelweaveConfig;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;

/// One scripted reply of [`MockCompletionProvider`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Raw response text
    Text(String),
    /// Provider failure
    Error(ProviderErrorKind),
    /// Missing credentials
    ConfigError(String),
}

impl MockResponse {
    /// Reply with bare JSON.
    pub fn json(value: Value) -> Self {
        Self::Text(value.to_string())
    }

    /// Reply with JSON wrapped in a markdown fence and chatter.
    pub fn fenced(value: Value) -> Self {
        Self::Text(format!(
            "好的，以下是结果：\n```json\n{}\n```\n希望有帮助。",
            serde_json::to_string_pretty(&value).unwrap()
        ))
    }

    /// Transient 503.
    pub fn unavailable() -> Self {
        Self::Error(ProviderErrorKind::HttpStatus {
            status_code: 503,
            message: "Service Unavailable".to_string(),
        })
    }

    /// Permanent 400.
    pub fn bad_request() -> Self {
        Self::Error(ProviderErrorKind::HttpStatus {
            status_code: 400,
            message: "Bad Request".to_string(),
        })
    }
}

/// Completion provider replaying queued responses in order.
///
/// Records every request so tests can inspect prompts. Running out of
/// responses is a 400 so a test that calls too often fails loudly.
#[derive(Clone, Default)]
pub struct MockCompletionProvider {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockCompletionProvider {
    pub fn new(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().collect())),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, req: &CompletionRequest) -> NovelweaveResult<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(req.clone());

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(MockResponse::Text(text)) => Ok(text),
            Some(MockResponse::Error(kind)) => Err(NovelweaveError::from(ProviderError::new(kind))),
            Some(MockResponse::ConfigError(message)) => Err(ConfigError::new(message).into()),
            None => Err(ProviderError::new(ProviderErrorKind::HttpStatus {
                status_code: 400,
                message: "mock responses exhausted".to_string(),
            })
            .into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// How [`MockImageProvider`] treats one prompt.
#[derive(Debug, Clone)]
pub enum ImageBehavior {
    /// Task succeeds on the first poll
    Succeed,
    /// Task never leaves the queue
    AlwaysPending,
    /// Task fails with a message
    Fail(String),
}

/// Image provider whose tasks resolve according to their prompt.
///
/// Prompts without an explicit behavior succeed with
/// `https://img.invalid/<prompt>.png`.
#[derive(Clone, Default)]
pub struct MockImageProvider {
    behaviors: Arc<HashMap<String, ImageBehavior>>,
    submitted: Arc<Mutex<Vec<String>>>,
    polls: Arc<AtomicUsize>,
}

impl MockImageProvider {
    pub fn new(behaviors: impl IntoIterator<Item = (&'static str, ImageBehavior)>) -> Self {
        Self {
            behaviors: Arc::new(
                behaviors
                    .into_iter()
                    .map(|(prompt, behavior)| (prompt.to_string(), behavior))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn submit(&self, prompt: &str, _style: ImageStyle) -> NovelweaveResult<String> {
        self.submitted.lock().unwrap().push(prompt.to_string());
        Ok(prompt.to_string())
    }

    async fn poll(&self, task_id: &str) -> NovelweaveResult<ImageTaskStatus> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(match self.behaviors.get(task_id) {
            None | Some(ImageBehavior::Succeed) => ImageTaskStatus::Succeeded {
                url: format!("https://img.invalid/{}.png", task_id),
            },
            Some(ImageBehavior::AlwaysPending) => ImageTaskStatus::Pending,
            Some(ImageBehavior::Fail(message)) => ImageTaskStatus::Failed {
                message: message.clone(),
            },
        })
    }
}

/// Defaults with millisecond retry and poll delays.
pub fn test_config() -> NovelweaveConfig {
    let mut config = NovelweaveConfig::default();
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_secs = 1;
    config.assets.enabled = true;
    config.assets.poll_interval_ms = 1;
    config.assets.max_poll_attempts = 3;
    config
}

/// Text long enough to split into exactly two segments at a blank line.
pub fn two_segment_text() -> String {
    format!("{}\n\n{}", "雨".repeat(2600), "夜".repeat(2600))
}

/// Drain every event published so far.
pub fn drain(rx: &mut UnboundedReceiver<PipelineEvent>) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Outline with two characters, two scenes and the given number of beats.
pub fn outline_json(beats: usize) -> Value {
    let beats: Vec<Value> = (1..=beats)
        .map(|i| {
            serde_json::json!({
                "id": i,
                "summary": format!("第{}个情节", i),
                "locationId": if i % 2 == 1 { "alley" } else { "rooftop" },
                "requiredCharacters": ["kael"]
            })
        })
        .collect();

    serde_json::json!({
        "title": "雨夜",
        "synopsis": "凯尔在雨夜把驱动器交给米拉。",
        "characters": [
            {"id": "kael", "name": "凯尔", "description": "走私者", "visualTraits": "tall, scarred, grey coat"},
            {"id": "mira", "name": "米拉", "description": "黑客", "visualTraits": "short silver hair"}
        ],
        "scenes": [
            {"id": "alley", "description": "霓虹小巷", "mood": "noir", "visualPrompt": "rainy neon alley at night"},
            {"id": "rooftop", "description": "天台", "mood": "tense", "visualPrompt": "rooftop over a rainy city"}
        ],
        "beats": beats
    })
}

/// Linear fragment of `count` nodes with ids `<prefix>1..` in `scene`.
pub fn fragment_json(prefix: &str, scene: &str, count: usize) -> Value {
    let nodes: Vec<Value> = (1..=count)
        .map(|i| {
            serde_json::json!({
                "id": format!("{}{}", prefix, i),
                "sceneId": scene,
                "characterId": if i % 2 == 0 { "kael" } else { "narration" },
                "text": format!("{}的第{}句。", prefix, i),
                "choices": []
            })
        })
        .collect();
    Value::Array(nodes)
}

/// Assert the structural guarantees every returned script must meet.
pub fn assert_playable(script: &novelweave_core::GalgameScript) {
    assert!(
        script.node(&script.start_node_id).is_some(),
        "start node {} missing",
        script.start_node_id
    );
    assert!(script.dangling_choices().is_empty(), "dangling: {:?}", script.dangling_choices());
    for node in &script.nodes {
        assert!(
            node.is_ending || !node.choices.is_empty(),
            "node {} is a silent dead end",
            node.id
        );
        assert!(script.scene(&node.scene_id).is_some(), "node {} has unknown scene", node.id);
    }
}
