//! Liveness endpoints.

use axum::Json;
use serde_json::{Value, json};

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "GitHub PR Agent is running" }))
}

/// GET /health
///
/// Static; does not contact the LLM, the index or GitHub.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
