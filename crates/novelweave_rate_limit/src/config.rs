//! Layered TOML configuration.
//!
//! Sources, later ones overriding earlier ones:
//! - Bundled defaults (include_str! from novelweave.toml)
//! - ~/.config/novelweave/novelweave.toml
//! - ./novelweave.toml
//! - An explicit file passed on the command line

use crate::Tier;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat};
use novelweave_error::{ConfigError, NovelweaveError, NovelweaveResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../novelweave.toml");

/// Quota for a provider plan.
///
/// ```toml
/// [providers.dashscope.tiers.free]
/// name = "Free"
/// rpm = 30
/// max_concurrent = 1
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TierConfig {
    /// Display name of the tier
    pub name: String,
    /// Requests per minute
    #[serde(default)]
    pub rpm: Option<u32>,
    /// Requests in flight
    #[serde(default)]
    pub max_concurrent: Option<u32>,
}

impl TierConfig {
    /// Build a tier by hand.
    pub fn new(name: impl Into<String>, rpm: Option<u32>, max_concurrent: Option<u32>) -> Self {
        Self {
            name: name.into(),
            rpm,
            max_concurrent,
        }
    }
}

impl Tier for TierConfig {
    fn rpm(&self) -> Option<u32> {
        self.rpm
    }

    fn max_concurrent(&self) -> Option<u32> {
        self.max_concurrent
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Endpoint, models and tiers of one provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Scheme and host, without a trailing slash
    pub base_url: String,
    /// Model for outline and fragment calls
    pub text_model: String,
    /// Model for streaming follow-up calls
    pub follow_up_model: String,
    /// Model for image synthesis
    pub image_model: String,
    /// Tier used when none is named
    pub default_tier: String,
    /// Known tiers by key
    #[serde(default)]
    pub tiers: HashMap<String, TierConfig>,
}

/// Sampling parameters for one kind of completion call.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationParams {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling threshold
    pub top_p: f32,
    /// Output token cap
    pub max_tokens: u32,
    /// Model override for this call kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GenerationParams {
    /// Parameters without a model override.
    pub fn new(temperature: f32, top_p: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            top_p,
            max_tokens,
            model: None,
        }
    }
}

/// Everything that shapes the prompts and their sampling.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Outline call
    pub outline: GenerationParams,
    /// Fragment calls
    pub fragment: GenerationParams,
    /// Streaming follow-up calls
    pub follow_up: GenerationParams,
    /// Beats expanded per fragment call
    pub beats_per_batch: usize,
    /// Label of synthesized forward choices
    pub continue_label: String,
    /// Language the script is written in
    pub language: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            outline: GenerationParams::new(0.3, 0.8, 2000),
            fragment: GenerationParams::new(0.3, 0.8, 3000),
            follow_up: GenerationParams::new(0.7, 0.9, 3000),
            beats_per_batch: 3,
            continue_label: "继续".to_string(),
            language: "Simplified Chinese".to_string(),
        }
    }
}

/// Backoff settings for remote calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// First delay in milliseconds
    pub base_delay_ms: u64,
    /// Cap on any single delay in seconds
    pub max_delay_secs: u64,
    /// Randomize delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_secs: 30,
            jitter: false,
        }
    }
}

/// Image back-fill settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Run back-fill after the script is assembled
    pub enabled: bool,
    /// Wait between task polls in milliseconds
    pub poll_interval_ms: u64,
    /// Polls before the task counts as timed out
    pub max_poll_attempts: u32,
    /// Requested image size, `width*height`
    pub image_size: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_ms: 2000,
            max_poll_attempts: 60,
            image_size: "1280*720".to_string(),
        }
    }
}

/// Top-level configuration.
///
/// # Example
///
/// ```no_run
/// use novelweave_rate_limit::NovelweaveConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = NovelweaveConfig::load()?;
/// let tier = config.get_tier("dashscope", None).unwrap();
/// println!("DashScope {} tier RPM: {:?}", tier.name, tier.rpm);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct NovelweaveConfig {
    /// Prompt sampling and batching
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Backoff for remote calls
    #[serde(default)]
    pub retry: RetryConfig,
    /// Image back-fill
    #[serde(default)]
    pub assets: AssetConfig,
    /// Provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl NovelweaveConfig {
    /// Load a single file, without bundled defaults.
    ///
    /// Sections absent from the file take their built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> NovelweaveResult<Self> {
        debug!("Loading configuration from file");
        Self::finish(Config::builder().add_source(File::from(path.as_ref())))
    }

    /// Load bundled defaults overlaid with the user's files.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file is malformed.
    #[instrument]
    pub fn load() -> NovelweaveResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");
        Self::finish(Self::layered())
    }

    /// Like [`NovelweaveConfig::load`], with `path` taking precedence over everything.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is missing or any present file is malformed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_with_override(path: impl AsRef<Path>) -> NovelweaveResult<Self> {
        Self::finish(Self::layered().add_source(File::from(path.as_ref())))
    }

    fn layered() -> ConfigBuilder<DefaultState> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/novelweave/novelweave.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder.add_source(File::with_name("novelweave").required(false))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> NovelweaveResult<Self> {
        builder
            .build()
            .map_err(|e| {
                NovelweaveError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                NovelweaveError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Configuration of a named provider.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider is not configured.
    pub fn provider(&self, name: &str) -> NovelweaveResult<&ProviderConfig> {
        self.providers.get(name).ok_or_else(|| {
            ConfigError::new(format!("Provider '{}' is not configured", name)).into()
        })
    }

    /// Tier of a provider, falling back to its default tier.
    #[instrument(skip(self))]
    pub fn get_tier(&self, provider: &str, tier_name: Option<&str>) -> Option<TierConfig> {
        let provider_config = self.providers.get(provider)?;
        let tier = tier_name.unwrap_or(&provider_config.default_tier);

        debug!(provider, tier, "Looking up tier configuration");

        provider_config.tiers.get(tier).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_match_builtin_defaults() {
        let bundled: NovelweaveConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(bundled.generation, GenerationConfig::default());
        assert_eq!(bundled.retry, RetryConfig::default());
        assert_eq!(bundled.assets, AssetConfig::default());
    }

    #[test]
    fn test_missing_provider_is_config_error() {
        let config = NovelweaveConfig::default();
        let err = config.provider("dashscope").unwrap_err();
        assert!(err.is_config());
    }
}
