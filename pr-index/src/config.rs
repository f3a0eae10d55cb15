//! Runtime and collection configuration.

use std::{fmt, str::FromStr, time::Duration};

use crate::errors::VectorStoreError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine similarity (what embedding models are tuned for).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2); scored as negative distance so higher is closer.
    Euclid,
}

/// Describes the vector space of the collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VectorSpace {
    /// Dimensionality of vectors.
    pub size: usize,
    /// Distance function.
    pub distance: DistanceKind,
}

impl VectorSpace {
    pub fn cosine(size: usize) -> Self {
        Self {
            size,
            distance: DistanceKind::Cosine,
        }
    }

    /// Rejects vectors of the wrong length.
    pub fn check(&self, vector: &[f32]) -> Result<(), VectorStoreError> {
        if vector.len() != self.size {
            return Err(VectorStoreError::VectorSizeMismatch {
                got: vector.len(),
                want: self.size,
            });
        }
        Ok(())
    }
}

/// Which backend holds the vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexBackend {
    Qdrant,
    Memory,
}

impl FromStr for IndexBackend {
    type Err = VectorStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(IndexBackend::Qdrant),
            "memory" => Ok(IndexBackend::Memory),
            other => Err(VectorStoreError::Config(format!(
                "unsupported index backend: {other}"
            ))),
        }
    }
}

impl fmt::Display for IndexBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexBackend::Qdrant => f.write_str("qdrant"),
            IndexBackend::Memory => f.write_str("memory"),
        }
    }
}

/// Configuration for the PR similarity index.
#[derive(Clone, Debug)]
pub struct IndexConfig {
    pub backend: IndexBackend,
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    pub space: VectorSpace,
    /// Per-call timeout for Qdrant requests.
    pub timeout: Duration,
}

impl IndexConfig {
    /// Defaults for a cosine collection of `size` dimensions on Qdrant.
    pub fn new_default(
        url: impl Into<String>,
        collection: impl Into<String>,
        size: usize,
    ) -> Self {
        Self {
            backend: IndexBackend::Qdrant,
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            space: VectorSpace::cosine(size),
            timeout: Duration::from_secs(60),
        }
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), VectorStoreError> {
        if self.space.size == 0 {
            return Err(VectorStoreError::Config("vector size must be > 0".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(VectorStoreError::Config("collection is empty".into()));
        }
        if self.backend == IndexBackend::Qdrant {
            let url = self.qdrant_url.trim();
            if url.is_empty() {
                return Err(VectorStoreError::Config("qdrant_url is empty".into()));
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(VectorStoreError::Config(
                    "qdrant_url must start with http:// or https://".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("Memory".parse::<IndexBackend>().unwrap(), IndexBackend::Memory);
        assert_eq!("qdrant".parse::<IndexBackend>().unwrap(), IndexBackend::Qdrant);
        assert!("redis".parse::<IndexBackend>().is_err());
    }

    #[test]
    fn validate_catches_bad_values() {
        let ok = IndexConfig::new_default("http://localhost:6334", "pr_cache", 1536);
        assert!(ok.validate().is_ok());

        let mut no_scheme = ok.clone();
        no_scheme.qdrant_url = "localhost:6334".into();
        assert!(no_scheme.validate().is_err());

        let mut memory = no_scheme.clone();
        memory.backend = IndexBackend::Memory;
        assert!(memory.validate().is_ok());

        let mut zero = ok;
        zero.space.size = 0;
        assert!(zero.validate().is_err());
    }
}
