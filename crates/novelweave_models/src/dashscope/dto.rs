//! Wire types for the DashScope REST API.

use novelweave_core::{ImageStyle, ImageTaskStatus};
use novelweave_error::{
    MalformedOutputError, MalformedOutputErrorKind, NovelweaveResult, ProviderError,
    ProviderErrorKind,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct TextGenerationRequest<'a> {
    pub model: &'a str,
    pub input: TextInput<'a>,
    pub parameters: TextParameters,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextInput<'a> {
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextParameters {
    pub result_format: &'static str,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextGenerationResponse {
    #[serde(default)]
    pub output: Option<TextOutput>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextOutput {
    #[serde(default)]
    pub choices: Vec<OutputChoice>,
    /// Present when `result_format` is "text"
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutputChoice {
    pub message: OutputMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutputMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl TextGenerationResponse {
    /// The assistant text of the first choice.
    pub fn into_content(self) -> NovelweaveResult<String> {
        let output = self
            .output
            .ok_or_else(|| ProviderError::new(ProviderErrorKind::EmptyResponse))?;
        let content = output
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .or(output.text)
            .filter(|c| !c.trim().is_empty());
        Ok(content.ok_or_else(|| ProviderError::new(ProviderErrorKind::EmptyResponse))?)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageSynthesisRequest<'a> {
    pub model: &'a str,
    pub input: ImageInput<'a>,
    pub parameters: ImageParameters<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageInput<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageParameters<'a> {
    pub style: &'static str,
    pub size: &'a str,
    pub n: u32,
}

/// Style tag understood by the Wanx models.
pub(crate) fn wanx_style(style: ImageStyle) -> &'static str {
    match style {
        ImageStyle::Sketch => "<sketch>",
        ImageStyle::Anime => "<anime>",
        ImageStyle::Reality => "<photography>",
    }
}

/// Envelope shared by task submission and task query.
#[derive(Debug, Deserialize)]
pub(crate) struct TaskResponse {
    #[serde(default)]
    pub output: Option<TaskOutput>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskOutput {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub task_status: Option<String>,
    #[serde(default)]
    pub results: Vec<TaskResult>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskResult {
    #[serde(default)]
    pub url: Option<String>,
}

impl TaskResponse {
    /// Task handle of a submission.
    pub fn into_task_id(self) -> NovelweaveResult<String> {
        let task_id = self
            .output
            .and_then(|o| o.task_id)
            .filter(|id| !id.is_empty());
        Ok(task_id.ok_or_else(|| ProviderError::new(ProviderErrorKind::MissingTaskId))?)
    }

    /// Status of a queried task.
    pub fn into_status(self) -> NovelweaveResult<ImageTaskStatus> {
        let output = self.output.ok_or_else(|| {
            MalformedOutputError::new(MalformedOutputErrorKind::UnexpectedShape(
                "task response has no output".to_string(),
            ))
        })?;

        let status = match output.task_status.as_deref() {
            Some("SUCCEEDED") => match output.results.into_iter().find_map(|r| r.url) {
                Some(url) => ImageTaskStatus::Succeeded { url },
                None => ImageTaskStatus::Failed {
                    message: "task succeeded without a result url".to_string(),
                },
            },
            Some("FAILED") | Some("CANCELED") | Some("UNKNOWN") => ImageTaskStatus::Failed {
                message: output
                    .message
                    .unwrap_or_else(|| "image generation failed".to_string()),
            },
            _ => ImageTaskStatus::Pending,
        };
        Ok(status)
    }
}
