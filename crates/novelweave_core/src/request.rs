//! Completion request type.

use serde::{Deserialize, Serialize};

/// A single system + user prompt sent to a text completion capability.
///
/// # Examples
///
/// ```
/// use novelweave_core::CompletionRequest;
///
/// let request = CompletionRequest::builder()
///     .system_instruction("You are a script director.")
///     .user_content("雨没有停。")
///     .temperature(0.7)
///     .build()
///     .unwrap();
///
/// assert_eq!(*request.temperature(), 0.7);
/// assert_eq!(*request.top_p(), 0.8);
/// assert!(request.model().is_none());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(setter(into))]
pub struct CompletionRequest {
    /// System prompt
    system_instruction: String,
    /// User turn
    user_content: String,
    /// Sampling temperature
    #[builder(default = "0.3")]
    temperature: f32,
    /// Nucleus sampling threshold
    #[builder(default = "0.8")]
    top_p: f32,
    /// Output token cap
    #[builder(default = "2000")]
    max_tokens: u32,
    /// Model override; the provider default is used when absent
    #[builder(default, setter(into, strip_option))]
    model: Option<String>,
}

impl CompletionRequest {
    /// Creates a new request builder.
    pub fn builder() -> CompletionRequestBuilder {
        CompletionRequestBuilder::default()
    }
}
