use axum::Json;
use serde_json::{json, Value};

/// GET /
/// Liveness check for the front-end and deploy probes.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "Server is running" }))
}
