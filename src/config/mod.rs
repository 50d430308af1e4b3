//! Configuration management for the pulse insights engine
//!
//! Configuration is loaded from environment variables or a TOML file and
//! validated before use. Provider credentials are only checked when the
//! corresponding provider is actually selected.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Text-completion provider configuration
    pub provider: ProviderConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Text-completion provider configuration
///
/// Three interchangeable back ends are supported; the `provider` field
/// selects which one the gateway talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Selected provider: "openai", "deepseek", or "gemini"
    pub provider: String,

    pub openai_api_key: String,
    pub openai_model: String,

    pub deepseek_api_key: String,
    pub deepseek_model: String,
    /// DeepSeek exposes an OpenAI-compatible API at a configurable base URL
    pub deepseek_base_url: String,

    pub gemini_api_key: String,
    pub gemini_model: String,

    /// Request timeout in seconds. A timed-out call is treated like any
    /// other provider failure.
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let provider = std::env::var("PULSE_LLM_PROVIDER")
            .unwrap_or_else(|_| String::from("openai"))
            .to_lowercase();

        let openai_api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let openai_model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| String::from("gpt-4o-mini"));

        let deepseek_api_key = std::env::var("DEEPSEEK_API_KEY").unwrap_or_default();
        let deepseek_model =
            std::env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| String::from("deepseek-chat"));
        let deepseek_base_url = std::env::var("DEEPSEEK_BASE_URL")
            .unwrap_or_else(|_| String::from("https://api.deepseek.com"));

        let gemini_api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| String::from("gemini-pro"));

        let timeout_secs = std::env::var("PULSE_PROVIDER_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let level = std::env::var("PULSE_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));
        let format = std::env::var("PULSE_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            provider: ProviderConfig {
                provider,
                openai_api_key,
                openai_model,
                deepseek_api_key,
                deepseek_model,
                deepseek_base_url,
                gemini_api_key,
                gemini_model,
                timeout_secs,
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.provider.provider.as_str(), "openai" | "deepseek" | "gemini") {
            anyhow::bail!("Unsupported LLM provider: {}", self.provider.provider);
        }

        if self.provider.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Get provider request timeout as Duration
    #[must_use]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: String::from("openai"),
            openai_api_key: String::new(),
            openai_model: String::from("gpt-4o-mini"),
            deepseek_api_key: String::new(),
            deepseek_model: String::from("deepseek-chat"),
            deepseek_base_url: String::from("https://api.deepseek.com"),
            gemini_api_key: String::new(),
            gemini_model: String::from("gemini-pro"),
            timeout_secs: 60,
        }
    }
}
