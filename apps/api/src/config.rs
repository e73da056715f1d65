use anyhow::{Context, Result};

use crate::story::budget::BudgetPolicy;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_TOKENS: u32 = 650;
const DEFAULT_REFERER: &str = "http://localhost:3001";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter_api_key: String,
    pub openrouter_base_url: String,
    pub port: u16,
    /// Token ceiling every process starts with.
    pub initial_max_tokens: u32,
    pub budget_policy: BudgetPolicy,
    pub app_env: String,
    pub http_referer: String,
    pub rust_log: String,
    pub llm_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            openrouter_api_key: lookup("OPENROUTER_API_KEY").with_context(|| {
                "Required environment variable 'OPENROUTER_API_KEY' is not set".to_string()
            })?,
            openrouter_base_url: var("OPENROUTER_BASE_URL", DEFAULT_BASE_URL),
            port: var("PORT", &DEFAULT_PORT.to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            initial_max_tokens: var("STORY_MAX_TOKENS", &DEFAULT_MAX_TOKENS.to_string())
                .parse::<u32>()
                .context("STORY_MAX_TOKENS must be a positive integer")?,
            budget_policy: var("TOKEN_BUDGET_POLICY", "persist").parse()?,
            app_env: var("APP_ENV", "production"),
            http_referer: var("HTTP_REFERER", DEFAULT_REFERER),
            rust_log: var("RUST_LOG", "info"),
            llm_timeout_secs: var("LLM_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
        })
    }

    /// Development mode exposes error chains in API error bodies.
    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }
}
