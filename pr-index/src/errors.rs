//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for index operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Existing collection was created with another vector size.
    #[error("collection '{collection}' has vector size {actual}, expected {expected}")]
    CollectionDimension {
        collection: String,
        actual: u64,
        expected: u64,
    },

    /// Vector does not match the configured space.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Payload could not be converted to or from the store format.
    #[error("payload error: {0}")]
    Payload(String),

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),
}

impl VectorStoreError {
    /// `true` for errors caused by configuration rather than a failed call.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            VectorStoreError::Config(_) | VectorStoreError::CollectionDimension { .. }
        )
    }
}
