// Tests for RateLimitedProvider using a local slow provider.

mod test_utils;

use novelweave_core::{ImageStyle, ImageTaskStatus};
use novelweave_error::{NovelweaveErrorKind, ProviderErrorKind, RetryableError};
use novelweave_interface::{CompletionProvider, ImageProvider};
use novelweave_models::RateLimitedProvider;
use novelweave_rate_limit::TierConfig;
use std::sync::Arc;
use std::time::Duration;
use test_utils::{create_test_request, SlowProvider};

#[tokio::test]
async fn test_passes_through_response() -> anyhow::Result<()> {
    let provider = RateLimitedProvider::new(
        SlowProvider::new(Duration::from_millis(1)),
        TierConfig::new("Test", None, Some(1)),
    );

    let text = provider.complete(&create_test_request("雨没有停。")).await?;

    assert_eq!(text, "echo: 雨没有停。");
    assert_eq!(provider.inner().call_count(), 1);
    assert_eq!(provider.provider_name(), "mock-slow");
    assert_eq!(provider.model_name(), "mock-model");
    Ok(())
}

#[tokio::test]
async fn test_one_request_at_a_time() -> anyhow::Result<()> {
    let provider = Arc::new(RateLimitedProvider::new(
        SlowProvider::new(Duration::from_millis(20)),
        TierConfig::new("Free", None, Some(1)),
    ));

    let mut handles = Vec::new();
    for i in 0..4 {
        let p = provider.clone();
        handles.push(tokio::spawn(async move {
            p.complete(&create_test_request(&format!("call {}", i))).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(provider.inner().call_count(), 4);
    assert_eq!(provider.inner().max_in_flight(), 1);
    Ok(())
}

#[tokio::test]
async fn test_image_calls_share_limiter() -> anyhow::Result<()> {
    let provider = RateLimitedProvider::new(
        SlowProvider::new(Duration::from_millis(1)),
        TierConfig::new("Free", None, Some(1)),
    );

    let task_id = provider.submit("a rainy alley", ImageStyle::Anime).await?;
    let status = provider.poll(&task_id).await?;

    assert!(matches!(status, ImageTaskStatus::Succeeded { .. }));
    assert_eq!(provider.inner().call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_errors_propagate_unchanged() {
    let provider = RateLimitedProvider::new(
        SlowProvider::failing(ProviderErrorKind::HttpStatus {
            status_code: 429,
            message: "Throttling".to_string(),
        }),
        TierConfig::new("Free", None, Some(1)),
    );

    let err = provider
        .complete(&create_test_request("hi"))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(err.kind(), NovelweaveErrorKind::Provider(_)));
}
