//! Story generation — orchestrates one story request.
//!
//! Flow: build prompt → completion (retried on token-limit errors) → sanitize.

use tracing::{debug, info, warn};

use crate::llm_client::{CompletionProvider, CompletionRequest};
use crate::story::budget::TokenBudget;
use crate::story::prompts::{build_story_prompt, STORY_SYSTEM};
use crate::story::request::StoryProfile;
use crate::story::retry::{next_step, GenerationError, Step, MAX_RETRIES};
use crate::story::sanitizer::sanitize_story;

/// A failed generation together with the ceiling the request last used.
#[derive(Debug)]
pub struct StoryFailure {
    pub error: GenerationError,
    pub ceiling: u32,
}

/// Generates a cleaned story for `profile`.
///
/// The first attempt uses `budget.starting_ceiling()`. Each token-limit error
/// lowers the ceiling to the reported allowance and is reported back to
/// `budget`, which decides whether later requests see it.
pub async fn generate_story(
    provider: &dyn CompletionProvider,
    budget: &TokenBudget,
    profile: &StoryProfile,
) -> Result<String, StoryFailure> {
    let prompt = build_story_prompt(profile);
    debug!("Story prompt: {prompt}");

    let mut attempt = 0;
    let mut ceiling = budget.starting_ceiling();

    loop {
        info!(
            "Requesting story for {} (attempt {}/{}, max_tokens={})",
            profile.child_name,
            attempt + 1,
            MAX_RETRIES,
            ceiling
        );

        let outcome = provider
            .complete(&CompletionRequest {
                system: STORY_SYSTEM,
                prompt: &prompt,
                max_tokens: ceiling,
            })
            .await;

        match next_step(attempt, outcome) {
            Step::Done(raw) => {
                let story = sanitize_story(&raw);
                info!("Story generated: {} chars", story.len());
                return Ok(story);
            }
            Step::Retry {
                attempt: next_attempt,
                ceiling: allowance,
            } => {
                budget.record_allowance(allowance);
                warn!(
                    "Adjusting token limit from {ceiling} to {allowance}, retrying (shared ceiling: {})",
                    budget.current()
                );
                attempt = next_attempt;
                ceiling = allowance;
            }
            Step::Fail(error) => {
                if let GenerationError::RetriesExhausted {
                    attempts, allowance, ..
                } = &error
                {
                    budget.record_allowance(*allowance);
                    warn!(
                        "Token limit still too high after {attempts} attempts (last allowance {allowance})"
                    );
                    ceiling = *allowance;
                }
                return Err(StoryFailure { error, ceiling });
            }
        }
    }
}
