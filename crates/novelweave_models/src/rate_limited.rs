//! Provider decorator enforcing tier quotas.

use async_trait::async_trait;
use novelweave_core::{CompletionRequest, ImageStyle, ImageTaskStatus};
use novelweave_error::NovelweaveResult;
use novelweave_interface::{CompletionProvider, ImageProvider};
use novelweave_rate_limit::{RateLimiter, TierConfig};
use std::fmt;
use tracing::instrument;

/// Wraps a provider so every call first waits on a [`RateLimiter`].
///
/// Completion and image calls share one limiter, matching a provider that
/// counts all requests against the same key.
///
/// # Example
///
/// ```
/// use novelweave_models::RateLimitedProvider;
/// use novelweave_rate_limit::TierConfig;
///
/// struct Offline;
///
/// let provider = RateLimitedProvider::new(Offline, TierConfig::new("Free", Some(30), Some(1)));
/// assert_eq!(provider.tier().name, "Free");
/// ```
pub struct RateLimitedProvider<P> {
    inner: P,
    limiter: RateLimiter<TierConfig>,
}

impl<P> RateLimitedProvider<P> {
    /// Wrap `inner` with the quota of `tier`.
    pub fn new(inner: P, tier: TierConfig) -> Self {
        Self {
            inner,
            limiter: RateLimiter::new(tier),
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// The enforced tier.
    pub fn tier(&self) -> &TierConfig {
        self.limiter.inner()
    }
}

impl<P: fmt::Debug> fmt::Debug for RateLimitedProvider<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitedProvider")
            .field("inner", &self.inner)
            .field("tier", self.tier())
            .finish()
    }
}

#[async_trait]
impl<P: CompletionProvider> CompletionProvider for RateLimitedProvider<P> {
    #[instrument(skip(self, req), fields(tier = %self.tier().name))]
    async fn complete(&self, req: &CompletionRequest) -> NovelweaveResult<String> {
        let _guard = self.limiter.acquire().await;
        self.inner.complete(req).await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[async_trait]
impl<P: ImageProvider> ImageProvider for RateLimitedProvider<P> {
    async fn submit(&self, prompt: &str, style: ImageStyle) -> NovelweaveResult<String> {
        let _guard = self.limiter.acquire().await;
        self.inner.submit(prompt, style).await
    }

    async fn poll(&self, task_id: &str) -> NovelweaveResult<ImageTaskStatus> {
        let _guard = self.limiter.acquire().await;
        self.inner.poll(task_id).await
    }
}
