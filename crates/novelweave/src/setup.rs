//! Configuration loading and provider construction shared by the CLI.

use novelweave_error::{ConfigError, NovelweaveResult};
use novelweave_models::{DashScopeClient, RateLimitedProvider, PROVIDER_NAME};
use novelweave_rate_limit::NovelweaveConfig;
use std::path::Path;
use std::sync::Arc;

/// DashScope client behind its tier's rate limiter.
pub type DashScopeProvider = RateLimitedProvider<DashScopeClient>;

/// Load configuration, optionally overridden by `path`.
///
/// Follow-up calls use the provider's `follow_up_model` unless the
/// generation settings name a model explicitly.
///
/// # Errors
///
/// Returns a configuration error if a file is missing or malformed.
#[tracing::instrument(skip_all, fields(path = ?path))]
pub fn load_config(path: Option<&Path>) -> NovelweaveResult<NovelweaveConfig> {
    let mut config = match path {
        Some(path) => NovelweaveConfig::load_with_override(path)?,
        None => NovelweaveConfig::load()?,
    };

    if config.generation.follow_up.model.is_none() {
        if let Some(provider) = config.providers.get(PROVIDER_NAME) {
            tracing::debug!(model = %provider.follow_up_model, "Using provider follow-up model");
            config.generation.follow_up.model = Some(provider.follow_up_model.clone());
        }
    }

    Ok(config)
}

/// Build the DashScope provider from `config` and `DASHSCOPE_API_KEY`.
///
/// `tier` selects a quota tier; the provider's default tier is used when
/// it is `None`.
///
/// # Errors
///
/// Returns a configuration error if the key, the provider section or the
/// tier is missing.
#[tracing::instrument(skip(config))]
pub fn dashscope_provider(
    config: &NovelweaveConfig,
    tier: Option<&str>,
) -> NovelweaveResult<Arc<DashScopeProvider>> {
    let tier_config = config.get_tier(PROVIDER_NAME, tier).ok_or_else(|| {
        ConfigError::new(format!(
            "Tier '{}' is not configured for provider '{}'",
            tier.unwrap_or("default"),
            PROVIDER_NAME
        ))
    })?;
    let client = DashScopeClient::from_env(config)?;

    tracing::info!(tier = %tier_config.name, rpm = ?tier_config.rpm, "DashScope provider ready");
    Ok(Arc::new(RateLimitedProvider::new(client, tier_config)))
}
