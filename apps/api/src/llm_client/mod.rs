//! LLM Client — the single point of entry for all chat-completion calls in StoryBot.
//!
//! ARCHITECTURAL RULE: No other module may call the provider API directly.
//! All LLM interactions MUST go through `CompletionProvider`.
//!
//! Model: anthropic/claude-2 via OpenRouter (hardcoded — do not make configurable to prevent drift)

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

#[cfg(test)]
pub mod testing;

/// The model used for every story completion.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "anthropic/claude-2";
/// Sent as `X-Title` so the provider can attribute usage.
pub const APP_TITLE: &str = "StoryBot";

const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 1.0;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An error object reported by the provider, either with a non-2xx status
    /// or embedded in an otherwise successful response body.
    #[error("{message}")]
    Api {
        status: Option<u16>,
        kind: Option<String>,
        message: String,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No response received from the API")]
    NoChoices,

    #[error("No story content in the response")]
    EmptyContent,
}

impl LlmError {
    /// HTTP status reported by the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Failure category. Provider errors without a `type` field have no category.
    pub fn kind(&self) -> Option<&str> {
        match self {
            LlmError::Api { kind, .. } => kind.as_deref(),
            LlmError::Http(_) => Some("transport_error"),
            LlmError::Parse(_) => Some("invalid_response"),
            LlmError::NoChoices | LlmError::EmptyContent => Some("empty_response"),
        }
    }

    fn from_provider(body: ProviderErrorBody, http_status: Option<u16>) -> Self {
        // OpenRouter reports numeric codes that mirror HTTP statuses; OpenAI uses strings.
        let code_status = body
            .code
            .as_ref()
            .and_then(|c| c.as_u64())
            .and_then(|c| u16::try_from(c).ok())
            .filter(|c| (100..=599).contains(c));

        LlmError::Api {
            status: http_status.or(code_status),
            kind: body.kind,
            message: body.message,
        }
    }
}

/// One story completion: the system role, the user prompt and the token ceiling
/// to send as `max_tokens`.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
}

/// Seam over the chat-completion provider. `LlmClient` is the production
/// implementation; tests substitute scripted providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the text of the first choice.
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    error: Option<ProviderErrorBody>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorEnvelope {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// The single LLM client used by StoryBot.
/// Wraps the OpenRouter chat-completions API (OpenAI wire format).
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    referer: String,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.openrouter_base_url.trim_end_matches('/').to_string(),
            api_key: config.openrouter_api_key.clone(),
            referer: config.http_referer.clone(),
        })
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    /// Makes one call to the chat-completions endpoint. No retries happen here;
    /// the story generator owns the retry policy.
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: request.max_tokens,
            top_p: TOP_P,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", APP_TITLE)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ProviderErrorEnvelope>(&text) {
                Ok(envelope) => LlmError::from_provider(envelope.error, Some(status.as_u16())),
                Err(_) => LlmError::Api {
                    status: Some(status.as_u16()),
                    kind: None,
                    message: text,
                },
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&text)?;

        if let Some(error) = completion.error {
            return Err(LlmError::from_provider(error, None));
        }

        if let Some(usage) = &completion.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let first = completion.choices.into_iter().next().ok_or(LlmError::NoChoices)?;

        first
            .message
            .and_then(|m| m.content)
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}
