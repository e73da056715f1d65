//! Token-limit retry policy.
//!
//! When an account cannot cover the requested `max_tokens`, the provider
//! answers with "... can only afford N ...". The request is repeated with a
//! ceiling of N, at most `MAX_RETRIES` attempts in total and without delay.
//! Every other failure ends the request on first occurrence.
//!
//! `next_step` is the whole transition table; it holds no state, so callers
//! thread the attempt counter and ceiling themselves.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Total attempts per story, including the first.
pub const MAX_RETRIES: u32 = 3;

static ALLOWANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"can only afford (\d+)").expect("allowance pattern is valid"));

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Provider(#[from] LlmError),

    /// Every attempt hit the token-limit error.
    #[error("Maximum retry attempts reached")]
    RetriesExhausted {
        attempts: u32,
        /// Allowance reported by the final attempt.
        allowance: u32,
        #[source]
        last: LlmError,
    },
}

impl GenerationError {
    /// HTTP status the provider reported for the failure, if any.
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            GenerationError::Provider(e) => e.status(),
            GenerationError::RetriesExhausted { .. } => None,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            GenerationError::Provider(e) => e.kind(),
            GenerationError::RetriesExhausted { .. } => Some("retries_exhausted"),
        }
    }
}

/// What to do after an attempt.
#[derive(Debug)]
pub enum Step {
    Done(String),
    Retry { attempt: u32, ceiling: u32 },
    Fail(GenerationError),
}

/// Extracts N from "can only afford N". Zero is not a usable allowance.
pub fn extract_allowance(message: &str) -> Option<u32> {
    ALLOWANCE
        .captures(message)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|&n| n > 0)
}

/// Decides the next step given the zero-based `attempt` that produced `outcome`.
pub fn next_step(attempt: u32, outcome: Result<String, LlmError>) -> Step {
    let err = match outcome {
        Ok(text) => return Step::Done(text),
        Err(err) => err,
    };

    let Some(allowance) = quota_allowance(&err) else {
        return Step::Fail(GenerationError::Provider(err));
    };

    if attempt + 1 < MAX_RETRIES {
        Step::Retry {
            attempt: attempt + 1,
            ceiling: allowance,
        }
    } else {
        Step::Fail(GenerationError::RetriesExhausted {
            attempts: MAX_RETRIES,
            allowance,
            last: err,
        })
    }
}

fn quota_allowance(err: &LlmError) -> Option<u32> {
    match err {
        LlmError::Api { message, .. } => extract_allowance(message),
        _ => None,
    }
}
