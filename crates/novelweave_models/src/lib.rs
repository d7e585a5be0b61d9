//! Model provider integrations for novelweave.
//!
//! # Available Providers
//!
//! - **DashScope** (Alibaba Cloud) - text generation with the Qwen family
//!   and asynchronous image synthesis with Wanx
//!
//! Any provider can be wrapped in [`RateLimitedProvider`] to respect its
//! tier quota.
//!
//! # Example
//!
//! ```no_run
//! use novelweave_core::CompletionRequest;
//! use novelweave_interface::CompletionProvider;
//! use novelweave_models::DashScopeClient;
//! use novelweave_rate_limit::NovelweaveConfig;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NovelweaveConfig::load()?;
//! let client = DashScopeClient::from_env(&config)?;
//! let request = CompletionRequest::builder()
//!     .system_instruction("Reply with one word.")
//!     .user_content("Hello")
//!     .build()?;
//! let text = client.complete(&request).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dashscope;
mod rate_limited;

pub use dashscope::{api_key_from_env, DashScopeClient, PROVIDER_NAME};
pub use rate_limited::RateLimitedProvider;
