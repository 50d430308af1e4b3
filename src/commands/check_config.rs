use anyhow::{Context, Result};

use pulse::config::Config;
use pulse::llm::LlmClient;

pub async fn check_config(file: Option<String>) -> Result<()> {
    let config = match &file {
        Some(path) => Config::from_file(std::path::Path::new(path))
            .with_context(|| format!("Failed to load config file {path}"))?,
        None => Config::from_env().context("Failed to load configuration from environment")?,
    };

    config.validate().context("Configuration is invalid")?;

    println!("Configuration OK");
    println!("  Provider: {}", config.provider.provider);
    println!("  Timeout: {}s", config.provider.timeout_secs);
    println!("  Log level: {}", config.logging.level);
    println!("  Log format: {}", config.logging.format);

    let client = LlmClient::new(config.provider)?;
    if client.has_credential() {
        println!("  Credential: present");
    } else {
        println!("  Credential: MISSING (analysis will use frequency fallback)");
    }

    Ok(())
}
