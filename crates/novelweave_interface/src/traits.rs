//! Trait definitions for text and image backends.

use async_trait::async_trait;
use novelweave_core::{CompletionRequest, ImageStyle, ImageTaskStatus};
use novelweave_error::NovelweaveResult;
use std::sync::Arc;

/// A text completion backend.
///
/// Implementations return the raw model text. Callers expect it may be
/// wrapped in markdown fences or surrounded by stray prose.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run one completion.
    async fn complete(&self, req: &CompletionRequest) -> NovelweaveResult<String>;

    /// Provider name (e.g., "dashscope").
    fn provider_name(&self) -> &'static str;

    /// Default model identifier (e.g., "qwen-plus").
    fn model_name(&self) -> &str;
}

/// An asynchronous submit-then-poll image backend.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Submit a generation task and return its handle.
    async fn submit(&self, prompt: &str, style: ImageStyle) -> NovelweaveResult<String>;

    /// Check the state of a previously submitted task.
    async fn poll(&self, task_id: &str) -> NovelweaveResult<ImageTaskStatus>;
}

#[async_trait]
impl<T: CompletionProvider + ?Sized> CompletionProvider for Arc<T> {
    async fn complete(&self, req: &CompletionRequest) -> NovelweaveResult<String> {
        (**self).complete(req).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

#[async_trait]
impl<T: ImageProvider + ?Sized> ImageProvider for Arc<T> {
    async fn submit(&self, prompt: &str, style: ImageStyle) -> NovelweaveResult<String> {
        (**self).submit(prompt, style).await
    }

    async fn poll(&self, task_id: &str) -> NovelweaveResult<ImageTaskStatus> {
        (**self).poll(task_id).await
    }
}
