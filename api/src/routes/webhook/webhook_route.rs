//! POST /webhook: runs the summarization pipeline for a `pull_request` event.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use pr_pipeline::{PipelineOutcome, PullRequestRecord};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::webhook::webhook_event::{PullRequestEvent, accepted_event, delivery_id},
};

/// Handler: POST /webhook
///
/// Every action of a `pull_request` event is processed, `closed` included.
/// The run is spawned so a dropped connection does not abandon the comment
/// or the upsert half way.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/webhook \
///   -H 'X-GitHub-Event: pull_request' \
///   -H 'content-type: application/json' \
///   -d '{"action":"opened","pull_request":{"number":1,"title":"t","body":"b","diff_url":"u"}}'
/// ```
#[instrument(name = "webhook_route", skip_all, fields(delivery = tracing::field::Empty))]
pub async fn webhook_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<PipelineOutcome>> {
    accepted_event(&headers)?;
    if let Some(id) = delivery_id(&headers) {
        tracing::Span::current().record("delivery", id);
    }

    let payload: Value =
        serde_json::from_slice(&body).map_err(|e| AppError::InvalidJson(e.to_string()))?;

    let event = PullRequestEvent::from_payload(&payload)?;
    let record = PullRequestRecord::from_webhook(event.pull_request).map_err(|e| {
        warn!(error = %e, "rejecting pull_request delivery");
        AppError::MissingPrFields
    })?;

    info!(pr = record.id, action = event.action_name(), "pull_request event accepted");

    let orchestrator = state.orchestrator.clone();
    let outcome = tokio::spawn(async move { orchestrator.process(&record).await })
        .await
        .map_err(|e| AppError::Internal(format!("pipeline task failed: {e}")))??;

    debug!(status = ?outcome.status, "webhook handled");
    Ok(Json(outcome))
}
