//! Axum route handlers for the Story API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::story::generator::generate_story;
use crate::story::request::StoryRequest;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub story: String,
}

/// POST /generate-story
///
/// Validates the child profile, generates a story and strips the model's lead-in.
/// Invalid input is rejected before the provider is contacted.
pub async fn handle_generate_story(
    State(state): State<AppState>,
    payload: Result<Json<StoryRequest>, JsonRejection>,
) -> Result<Json<StoryResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let profile = request.validate()?;

    let story = generate_story(state.provider.as_ref(), &state.budget, &profile)
        .await
        .map_err(|failure| AppError::Generation {
            source: failure.error,
            current_max_tokens: failure.ceiling,
            include_stack: state.config.is_development(),
        })?;

    Ok(Json(StoryResponse { story }))
}
