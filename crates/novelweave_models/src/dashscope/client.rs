//! DashScope HTTP client.

use super::dto::{
    wanx_style, ChatMessage, ImageInput, ImageParameters, ImageSynthesisRequest, TaskResponse,
    TextGenerationRequest, TextGenerationResponse, TextInput, TextParameters,
};
use async_trait::async_trait;
use novelweave_core::{CompletionRequest, ImageStyle, ImageTaskStatus};
use novelweave_error::{
    ConfigError, MalformedOutputError, MalformedOutputErrorKind, NovelweaveResult, ProviderError,
    ProviderErrorKind,
};
use novelweave_interface::{CompletionProvider, ImageProvider};
use novelweave_rate_limit::{NovelweaveConfig, ProviderConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Provider key in configuration and logs.
pub const PROVIDER_NAME: &str = "dashscope";

const TEXT_GENERATION_PATH: &str = "/api/v1/services/aigc/text-generation/generation";
const IMAGE_SYNTHESIS_PATH: &str = "/api/v1/services/aigc/text2image/image-synthesis";
const TASKS_PATH: &str = "/api/v1/tasks";

/// Environment variables consulted for the API key, in order.
const API_KEY_VARS: [&str; 2] = ["DASHSCOPE_API_KEY", "API_KEY"];

/// Longest error body kept in a provider error.
const ERROR_BODY_LIMIT: usize = 500;

/// Read the API key from the environment.
///
/// # Errors
///
/// Returns a configuration error if no variable holds a non-empty key.
pub fn api_key_from_env() -> NovelweaveResult<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            ConfigError::new(format!(
                "API key missing: set one of {}",
                API_KEY_VARS.join(", ")
            ))
            .into()
        })
}

/// Client for DashScope text generation and Wanx image synthesis.
#[derive(Debug, Clone)]
pub struct DashScopeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    image_size: String,
}

impl DashScopeClient {
    /// Create a client with an explicit key.
    ///
    /// # Errors
    ///
    /// Returns error if the key is empty or the HTTP client cannot be built.
    #[instrument(skip_all, fields(base_url = %provider.base_url))]
    pub fn new(
        api_key: impl Into<String>,
        provider: &ProviderConfig,
        image_size: impl Into<String>,
    ) -> NovelweaveResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::new("DashScope API key is empty").into());
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(180))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            text_model: provider.text_model.clone(),
            image_model: provider.image_model.clone(),
            image_size: image_size.into(),
        })
    }

    /// Create a client from configuration and the environment key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key or the provider section is missing.
    pub fn from_env(config: &NovelweaveConfig) -> NovelweaveResult<Self> {
        let api_key = api_key_from_env()?;
        let provider = config.provider(PROVIDER_NAME)?;
        Self::new(api_key, provider, config.assets.image_size.clone())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> NovelweaveResult<T> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Transport(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                body.chars().take(ERROR_BODY_LIMIT).collect()
            };
            warn!(status = status.as_u16(), %message, "DashScope request failed");
            return Err(ProviderError::new(ProviderErrorKind::HttpStatus {
                status_code: status.as_u16(),
                message,
            })
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Transport(e.to_string())))?;
        serde_json::from_str(&body).map_err(|e| {
            MalformedOutputError::new(MalformedOutputErrorKind::InvalidJson {
                message: e.to_string(),
                preview: body.chars().take(200).collect(),
            })
            .into()
        })
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        async_task: bool,
    ) -> NovelweaveResult<T> {
        let mut request = self.http.post(self.endpoint(path)).json(body);
        if async_task {
            request = request.header("X-DashScope-Async", "enable");
        }
        self.send(request).await
    }
}

#[async_trait]
impl CompletionProvider for DashScopeClient {
    #[instrument(
        skip(self, req),
        fields(
            provider = PROVIDER_NAME,
            model = req.model().as_deref().unwrap_or(self.text_model.as_str()),
            user_chars = req.user_content().chars().count(),
        )
    )]
    async fn complete(&self, req: &CompletionRequest) -> NovelweaveResult<String> {
        let model = req.model().as_deref().unwrap_or(self.text_model.as_str());
        let body = TextGenerationRequest {
            model,
            input: TextInput {
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: req.system_instruction(),
                    },
                    ChatMessage {
                        role: "user",
                        content: req.user_content(),
                    },
                ],
            },
            parameters: TextParameters {
                result_format: "message",
                temperature: *req.temperature(),
                top_p: *req.top_p(),
                max_tokens: *req.max_tokens(),
            },
        };

        let response: TextGenerationResponse = self.post(TEXT_GENERATION_PATH, &body, false).await?;
        let content = response.into_content()?;
        debug!(response_chars = content.chars().count(), "Completion received");
        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn model_name(&self) -> &str {
        &self.text_model
    }
}

#[async_trait]
impl ImageProvider for DashScopeClient {
    #[instrument(skip(self, prompt), fields(provider = PROVIDER_NAME, model = %self.image_model))]
    async fn submit(&self, prompt: &str, style: ImageStyle) -> NovelweaveResult<String> {
        let body = ImageSynthesisRequest {
            model: &self.image_model,
            input: ImageInput { prompt },
            parameters: ImageParameters {
                style: wanx_style(style),
                size: &self.image_size,
                n: 1,
            },
        };

        let response: TaskResponse = self.post(IMAGE_SYNTHESIS_PATH, &body, true).await?;
        let task_id = response.into_task_id()?;
        debug!(task_id = %task_id, "Image task submitted");
        Ok(task_id)
    }

    #[instrument(skip(self), fields(provider = PROVIDER_NAME))]
    async fn poll(&self, task_id: &str) -> NovelweaveResult<ImageTaskStatus> {
        let request = self
            .http
            .get(self.endpoint(&format!("{}/{}", TASKS_PATH, task_id)));
        let response: TaskResponse = self.send(request).await?;
        let status = response.into_status()?;
        debug!(?status, "Image task polled");
        Ok(status)
    }
}
