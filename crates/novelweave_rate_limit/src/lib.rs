//! Retry, rate limiting and configuration.
//!
//! Every remote call made by the pipeline passes through two layers from
//! this crate:
//!
//! - [`RateLimiter`] enforces the provider's requests-per-minute quota and a
//!   concurrency cap (one request at a time by default).
//! - [`retry_with_backoff`] re-runs transient failures with exponential
//!   backoff and re-raises the last error once attempts run out.
//!
//! [`NovelweaveConfig`] loads the tunables for both, plus generation
//! parameters, from layered TOML files.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod limiter;
mod retry;
mod tier;

pub use config::{
    AssetConfig, GenerationConfig, GenerationParams, NovelweaveConfig, ProviderConfig,
    RetryConfig, TierConfig,
};
pub use limiter::{RateLimiter, RateLimiterGuard};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use tier::Tier;
