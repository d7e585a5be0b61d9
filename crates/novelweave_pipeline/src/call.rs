//! Shared plumbing for JSON-producing completion calls.

use crate::parse_response;
use novelweave_core::CompletionRequest;
use novelweave_error::{NovelweaveResult, PipelineError, PipelineErrorKind};
use novelweave_interface::CompletionProvider;
use novelweave_rate_limit::{retry_with_backoff, GenerationParams, RetryPolicy};
use serde_json::Value;

pub(crate) fn build_request(
    system_instruction: String,
    user_content: String,
    params: &GenerationParams,
) -> NovelweaveResult<CompletionRequest> {
    let mut builder = CompletionRequest::builder();
    builder
        .system_instruction(system_instruction)
        .user_content(user_content)
        .temperature(params.temperature)
        .top_p(params.top_p)
        .max_tokens(params.max_tokens);
    if let Some(model) = &params.model {
        builder.model(model.clone());
    }
    builder
        .build()
        .map_err(|e| PipelineError::new(PipelineErrorKind::Builder(e.to_string())).into())
}

/// Run `request` under the retry policy and parse the JSON payload.
///
/// Only the remote call is retried; a response that does not parse fails at once.
pub(crate) async fn complete_json<P: CompletionProvider>(
    provider: &P,
    retry: &RetryPolicy,
    operation: &str,
    request: &CompletionRequest,
) -> NovelweaveResult<Value> {
    let response = retry_with_backoff(retry, operation, || provider.complete(request)).await?;
    tracing::debug!(
        operation,
        response_chars = response.chars().count(),
        "Completion received"
    );
    parse_response(&response)
}
