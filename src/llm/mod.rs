//! Provider gateway for text completion
//!
//! A uniform request/response abstraction over three interchangeable
//! text-completion back ends (OpenAI, DeepSeek, Gemini). The gateway is
//! responsible only for transport and response envelope unwrapping; retry
//! policy, if any, belongs to the caller. The text analyzer treats every
//! failure here as "provider unavailable" and falls back to deterministic
//! analysis.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};

const OPENAI_API_URL: &str = "https://api.openai.com";
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Selected text-completion back end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Deepseek,
    Gemini,
}

impl Provider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "deepseek" => Some(Self::Deepseek),
            "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Deepseek => "deepseek",
            Self::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait seam over text completion so analysis code can be exercised
/// without a live provider.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Generate a completion for `prompt`, optionally steered by a system
    /// prompt, at the given sampling temperature.
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
    ) -> Result<String>;
}

/// Unified client over the configured provider
pub struct LlmClient {
    http: Client,
    provider: Provider,
    config: ProviderConfig,
}

impl LlmClient {
    /// Create a client for the configured provider.
    ///
    /// Fails with a configuration error when the provider selector is not
    /// one of the supported back ends. Credentials are checked lazily, per
    /// call, so a client for an unused provider can always be built.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let provider = Provider::parse(&config.provider).ok_or_else(|| {
            Error::configuration(format!("Unsupported LLM provider: {}", config.provider))
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            provider,
            config,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Whether the selected provider has a credential configured.
    pub fn has_credential(&self) -> bool {
        match self.provider {
            Provider::OpenAi => !self.config.openai_api_key.is_empty(),
            Provider::Deepseek => !self.config.deepseek_api_key.is_empty(),
            Provider::Gemini => !self.config.gemini_api_key.is_empty(),
        }
    }

    /// OpenAI-compatible chat completion (used by both OpenAI and DeepSeek)
    async fn chat_completion(
        &self,
        base_url: &str,
        api_key: &str,
        model: &str,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
    ) -> Result<String> {
        let url = format!("{base_url}/v1/chat/completions");

        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model,
            messages,
            temperature,
        };

        tracing::debug!(provider = %self.provider, model = %model, "chat completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(format!(
                "{} request failed: {status} - {body}",
                self.provider
            )));
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| Error::provider(format!("unexpected response envelope: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::provider("response contained no choices"))
    }

    async fn gemini_completion(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
    ) -> Result<String> {
        let url = format!(
            "{GEMINI_API_URL}/v1beta/models/{}:generateContent?key={}",
            self.config.gemini_model, self.config.gemini_api_key
        );

        // Gemini has no separate system role; prepend the system prompt.
        let text = match system_prompt {
            Some(system) => format!("{system}\n\n{prompt}"),
            None => prompt.to_string(),
        };

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text }],
            }],
            generation_config: GeminiGenerationConfig { temperature },
        };

        tracing::debug!(model = %self.config.gemini_model, "gemini completion request");

        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(format!(
                "gemini request failed: {status} - {body}"
            )));
        }

        let body = response.text().await?;
        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| Error::provider(format!("unexpected response envelope: {e}")))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::provider("response contained no candidates"))
    }
}

#[async_trait]
impl TextCompletion for LlmClient {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
    ) -> Result<String> {
        match self.provider {
            Provider::OpenAi => {
                if self.config.openai_api_key.is_empty() {
                    return Err(Error::configuration("OpenAI API key not configured"));
                }
                self.chat_completion(
                    OPENAI_API_URL,
                    &self.config.openai_api_key,
                    &self.config.openai_model,
                    prompt,
                    system_prompt,
                    temperature,
                )
                .await
            }
            Provider::Deepseek => {
                if self.config.deepseek_api_key.is_empty() {
                    return Err(Error::configuration("DeepSeek API key not configured"));
                }
                self.chat_completion(
                    &self.config.deepseek_base_url,
                    &self.config.deepseek_api_key,
                    &self.config.deepseek_model,
                    prompt,
                    system_prompt,
                    temperature,
                )
                .await
            }
            Provider::Gemini => {
                if self.config.gemini_api_key.is_empty() {
                    return Err(Error::configuration("Gemini API key not configured"));
                }
                self.gemini_completion(prompt, system_prompt, temperature)
                    .await
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: String,
}
