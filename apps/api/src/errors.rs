use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::story::retry::GenerationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Story generation failed: {source}")]
    Generation {
        source: GenerationError,
        /// Token ceiling in effect when the request gave up.
        current_max_tokens: u32,
        include_stack: bool,
    },
}

/// `details` object of a generation failure body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationErrorDetails {
    message: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    status_code: u16,
    current_max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Generation {
                source,
                current_max_tokens,
                include_stack,
            } => {
                let status = source
                    .provider_status()
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

                let details = GenerationErrorDetails {
                    message: source.to_string(),
                    kind: source.kind().unwrap_or("Unknown").to_string(),
                    status: source.provider_status(),
                    status_code: status.as_u16(),
                    current_max_tokens,
                    stack: include_stack.then(|| error_chain(&source)),
                };

                tracing::error!(
                    "Error generating story: {} (type={}, status={}, max_tokens={})",
                    details.message,
                    details.kind,
                    details.status_code,
                    current_max_tokens
                );

                let body = Json(json!({
                    "error": "Failed to generate story",
                    "message": details.message,
                    "details": details,
                }));

                (status, body).into_response()
            }
        }
    }
}

/// Renders an error and its sources, one per line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut lines = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {cause}"));
        source = cause.source();
    }
    lines.join("\n")
}
