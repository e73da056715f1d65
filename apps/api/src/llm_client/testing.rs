//! Scripted `CompletionProvider` for exercising the story pipeline without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionProvider, CompletionRequest, LlmError};

/// Replays a fixed list of outcomes in order and records the `max_tokens`
/// each call was made with.
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Result<String, LlmError>>>,
    ceilings: Mutex<Vec<u32>>,
}

impl ScriptedProvider {
    pub fn new(outcomes: Vec<Result<String, LlmError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            ceilings: Mutex::new(Vec::new()),
        }
    }

    /// `max_tokens` of every call made so far, in order.
    pub fn ceilings(&self) -> Vec<u32> {
        self.ceilings.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.ceilings.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        self.ceilings.lock().unwrap().push(request.max_tokens);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected provider call #{}", self.calls()))
    }
}

/// The error OpenRouter returns when the account cannot cover `max_tokens`.
pub fn quota_error(allowance: u32) -> LlmError {
    LlmError::Api {
        status: Some(402),
        kind: None,
        message: format!(
            "This request requires more credits, or fewer max_tokens. \
             You requested up to 650 tokens, but can only afford {allowance}."
        ),
    }
}

pub fn api_error(status: u16, message: &str) -> LlmError {
    LlmError::Api {
        status: Some(status),
        kind: Some("invalid_request_error".to_string()),
        message: message.to_string(),
    }
}
