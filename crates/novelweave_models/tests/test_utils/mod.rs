//! Test utilities for novelweave_models tests.

use async_trait::async_trait;
use novelweave_core::{CompletionRequest, ImageStyle, ImageTaskStatus};
use novelweave_error::{NovelweaveError, NovelweaveResult, ProviderError, ProviderErrorKind};
use novelweave_interface::{CompletionProvider, ImageProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Provider that answers after a delay and records how many calls overlap.
pub struct SlowProvider {
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<Mutex<usize>>,
    call_count: Arc<AtomicUsize>,
    fail_with: Option<ProviderErrorKind>,
}

impl SlowProvider {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(Mutex::new(0)),
            call_count: Arc::new(AtomicUsize::new(0)),
            fail_with: None,
        }
    }

    pub fn failing(kind: ProviderErrorKind) -> Self {
        Self {
            fail_with: Some(kind),
            ..Self::new(Duration::from_millis(1))
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        *self.max_in_flight.lock().unwrap()
    }

    async fn enter(&self) -> NovelweaveResult<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut max = self.max_in_flight.lock().unwrap();
            *max = (*max).max(now);
        }
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.fail_with {
            Some(kind) => Err(NovelweaveError::from(ProviderError::new(kind.clone()))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CompletionProvider for SlowProvider {
    async fn complete(&self, req: &CompletionRequest) -> NovelweaveResult<String> {
        self.enter().await?;
        Ok(format!("echo: {}", req.user_content()))
    }

    fn provider_name(&self) -> &'static str {
        "mock-slow"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

#[async_trait]
impl ImageProvider for SlowProvider {
    async fn submit(&self, _prompt: &str, _style: ImageStyle) -> NovelweaveResult<String> {
        self.enter().await?;
        Ok("task-1".to_string())
    }

    async fn poll(&self, _task_id: &str) -> NovelweaveResult<ImageTaskStatus> {
        self.enter().await?;
        Ok(ImageTaskStatus::Succeeded {
            url: "https://example.invalid/1.png".to_string(),
        })
    }
}

/// Helper to build a request.
pub fn create_test_request(prompt: &str) -> CompletionRequest {
    CompletionRequest::builder()
        .system_instruction("You are a test.")
        .user_content(prompt)
        .build()
        .expect("Failed to build test request")
}
