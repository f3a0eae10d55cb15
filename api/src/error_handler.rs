use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pr_index::VectorStoreError;
use pr_pipeline::{PipelineError, PipelineStatus, SourceError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::core::config::ConfigError;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Webhook validation ---
    #[error("Missing X-GitHub-Event header")]
    MissingEventHeader,

    #[error("Unsupported event: {0}")]
    UnsupportedEvent(String),

    #[error("Invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Missing PR fields")]
    MissingPrFields,

    // --- Pipeline ---
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("internal error: {0}")]
    Internal(String),

    // --- Batch commands ---
    #[error(transparent)]
    Backfill(#[from] SourceError),

    #[error("failed to delete PR {id} from the index")]
    Delete {
        id: u64,
        #[source]
        source: VectorStoreError,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingEventHeader
            | AppError::UnsupportedEvent(_)
            | AppError::MissingPrFields => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_)
            | AppError::Bind(_)
            | AppError::Server(_)
            | AppError::InvalidJson(_)
            | AppError::Pipeline(_)
            | AppError::Internal(_)
            | AppError::Backfill(_)
            | AppError::Delete { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Request-validation errors answer with `{"detail"}`, the rest with
    /// `{"status": "error", "message"}`.
    fn body(&self) -> ErrorBody {
        match self {
            AppError::MissingEventHeader
            | AppError::UnsupportedEvent(_)
            | AppError::Unprocessable(_) => ErrorBody::Detail {
                detail: self.to_string(),
            },
            _ => ErrorBody::Status {
                status: PipelineStatus::Error,
                message: self.to_string(),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum ErrorBody {
    Detail {
        detail: String,
    },
    Status {
        status: PipelineStatus,
        message: String,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<ai_llm_service::AiLlmError> for AppError {
    fn from(e: ai_llm_service::AiLlmError) -> Self {
        AppError::Config(ConfigError::Llm(e))
    }
}

impl From<VectorStoreError> for AppError {
    fn from(e: VectorStoreError) -> Self {
        AppError::Config(ConfigError::Index(e))
    }
}

impl From<git_host::GitHostError> for AppError {
    fn from(e: git_host::GitHostError) -> Self {
        AppError::Config(ConfigError::GitHub(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_use_detail_shape() {
        let v = serde_json::to_value(AppError::UnsupportedEvent("push".into()).body()).unwrap();
        assert_eq!(v, serde_json::json!({"detail": "Unsupported event: push"}));
    }

    #[test]
    fn github_setup_errors_keep_their_cause() {
        let err = AppError::from(git_host::GitHostError::Config(
            "invalid base api url: ftp://example.com".into(),
        ));
        assert!(matches!(
            err,
            AppError::Config(ConfigError::GitHub(git_host::GitHostError::Config(_)))
        ));
        assert_eq!(
            err.to_string(),
            "invalid GitHub settings: config error: invalid base api url: ftp://example.com"
        );
    }

    #[test]
    fn field_errors_use_status_shape() {
        let err = AppError::MissingPrFields;
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let v = serde_json::to_value(err.body()).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"status": "error", "message": "Missing PR fields"})
        );
    }
}
