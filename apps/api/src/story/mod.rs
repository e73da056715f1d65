// Bedtime story generation.
// Implements: request validation, prompt building, token-limit retry, lead-in cleanup.
// All LLM calls go through llm_client — no direct provider calls here.

pub mod budget;
pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod request;
pub mod retry;
pub mod sanitizer;
