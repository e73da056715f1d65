use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionProvider;
use crate::story::budget::TokenBudget;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Chat-completion provider. Production: `LlmClient`.
    pub provider: Arc<dyn CompletionProvider>,
    /// Token ceiling shared across requests, governed by its `BudgetPolicy`.
    pub budget: Arc<TokenBudget>,
    pub config: Config,
}
