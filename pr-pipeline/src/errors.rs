//! Errors at the capability boundaries of the pipeline.
//!
//! Only [`PipelineError`] ever leaves [`crate::Orchestrator::process`]; the
//! others are absorbed into the outcome flags.

use ai_llm_service::AiLlmError;
use git_host::GitHostError;
use pr_index::VectorStoreError;
use thiserror::Error;

/// The `pull_request` object lacks required fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing PR fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider failed: {0}")]
    Provider(#[from] AiLlmError),

    #[error("embedding has {got} dimensions, expected {want}")]
    Dimension { got: usize, want: usize },

    #[error("embedding unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Store(#[from] VectorStoreError),

    #[error("index unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum PostError {
    #[error(transparent)]
    Host(#[from] GitHostError),

    #[error("comment rejected: {0}")]
    Rejected(String),
}

/// Listing pull requests for a backfill failed; nothing was ingested.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to list pull requests: {0}")]
    Host(#[from] GitHostError),

    #[error("pull request source unavailable: {0}")]
    Unavailable(String),
}

/// Hard pipeline failure: nothing was summarized, posted or stored.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to generate embedding: {0}")]
    Embedding(#[from] EmbeddingError),
}
