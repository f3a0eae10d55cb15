//! Similarity index for pull-request embeddings.
//!
//! Points are keyed by PR number and carry a `{"text": ...}` payload.
//! Two backends share one contract:
//! - [`QdrantIndex`]: Qdrant collection, created once per process.
//! - [`MemoryIndex`]: process-local map, for development and tests.
//!
//! [`PrIndex`] picks one at startup from [`IndexConfig::backend`].

mod config;
mod errors;
mod memory;
mod qdrant_facade;
mod record;

pub use config::{DistanceKind, IndexBackend, IndexConfig, VectorSpace};
pub use errors::VectorStoreError;
pub use memory::MemoryIndex;
pub use qdrant_facade::QdrantIndex;
pub use record::{IndexHit, Payload, text_payload};

use tracing::{info, trace};

/// High-level facade over the configured backend.
///
/// This is the single entry point recommended for application code.
pub enum PrIndex {
    Qdrant(QdrantIndex),
    Memory(MemoryIndex),
}

impl PrIndex {
    /// Constructs the backend named by `cfg.backend`.
    ///
    /// # Errors
    /// Returns [`VectorStoreError::Config`] for invalid settings or a Qdrant
    /// client that cannot be built.
    pub fn new(cfg: &IndexConfig) -> Result<Self, VectorStoreError> {
        cfg.validate()?;
        info!(backend = %cfg.backend, collection = %cfg.collection, size = cfg.space.size, "PrIndex::new");
        Ok(match cfg.backend {
            IndexBackend::Qdrant => PrIndex::Qdrant(QdrantIndex::new(cfg)?),
            IndexBackend::Memory => PrIndex::Memory(MemoryIndex::new(cfg.space)),
        })
    }

    pub fn space(&self) -> VectorSpace {
        match self {
            PrIndex::Qdrant(q) => q.space(),
            PrIndex::Memory(m) => m.space(),
        }
    }

    /// Idempotent schema setup; a no-op for the memory backend.
    pub async fn ensure_ready(&self) -> Result<(), VectorStoreError> {
        match self {
            PrIndex::Qdrant(q) => q.ensure_collection().await,
            PrIndex::Memory(_) => Ok(()),
        }
    }

    /// Inserts or replaces point `id`.
    pub async fn upsert(
        &self,
        id: u64,
        vector: Vec<f32>,
        payload: Payload,
    ) -> Result<(), VectorStoreError> {
        trace!(id, "PrIndex::upsert");
        match self {
            PrIndex::Qdrant(q) => q.upsert(id, vector, payload).await,
            PrIndex::Memory(m) => m.upsert(id, vector, payload).await,
        }
    }

    /// Top-`k` hits ordered by descending score.
    pub async fn search(&self, vector: Vec<f32>, k: u64) -> Result<Vec<IndexHit>, VectorStoreError> {
        trace!(k, "PrIndex::search");
        match self {
            PrIndex::Qdrant(q) => q.search(vector, k).await,
            PrIndex::Memory(m) => m.search(vector, k).await,
        }
    }

    /// Payload stored for `id`, if any.
    pub async fn get(&self, id: u64) -> Result<Option<Payload>, VectorStoreError> {
        match self {
            PrIndex::Qdrant(q) => q.get(id).await,
            PrIndex::Memory(m) => Ok(m.get(id).await),
        }
    }

    /// Removes point `id`; unknown ids are a no-op.
    pub async fn delete(&self, id: u64) -> Result<(), VectorStoreError> {
        trace!(id, "PrIndex::delete");
        match self {
            PrIndex::Qdrant(q) => q.delete(id).await,
            PrIndex::Memory(m) => {
                m.delete(id).await;
                Ok(())
            }
        }
    }
}
