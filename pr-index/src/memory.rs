//! Process-local index with the same contract as the Qdrant facade.
//!
//! Brute-force scoring over every stored point; fine for development
//! setups and tests, not for large histories.

use std::{cmp::Ordering, collections::HashMap};

use tokio::sync::RwLock;
use tracing::debug;

use crate::config::{DistanceKind, VectorSpace};
use crate::errors::VectorStoreError;
use crate::record::{IndexHit, Payload};

#[derive(Debug)]
struct StoredPoint {
    vector: Vec<f32>,
    payload: Payload,
}

#[derive(Debug)]
pub struct MemoryIndex {
    space: VectorSpace,
    points: RwLock<HashMap<u64, StoredPoint>>,
}

impl MemoryIndex {
    pub fn new(space: VectorSpace) -> Self {
        Self {
            space,
            points: RwLock::new(HashMap::new()),
        }
    }

    pub fn space(&self) -> VectorSpace {
        self.space
    }

    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }

    /// Inserts or replaces the point `id` (last write wins).
    pub async fn upsert(
        &self,
        id: u64,
        vector: Vec<f32>,
        payload: Payload,
    ) -> Result<(), VectorStoreError> {
        self.space.check(&vector)?;
        let replaced = self
            .points
            .write()
            .await
            .insert(id, StoredPoint { vector, payload })
            .is_some();
        debug!(id, replaced, "memory upsert");
        Ok(())
    }

    /// Top-`k` by score, highest first; ties keep the smaller id first.
    pub async fn search(&self, vector: Vec<f32>, k: u64) -> Result<Vec<IndexHit>, VectorStoreError> {
        self.space.check(&vector)?;
        let points = self.points.read().await;

        let mut hits: Vec<IndexHit> = points
            .iter()
            .map(|(id, p)| IndexHit {
                id: *id,
                score: score(self.space.distance, &vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        hits.truncate(usize::try_from(k).unwrap_or(usize::MAX));
        Ok(hits)
    }

    pub async fn get(&self, id: u64) -> Option<Payload> {
        self.points.read().await.get(&id).map(|p| p.payload.clone())
    }

    /// Removes point `id`; returns whether it was present.
    pub async fn delete(&self, id: u64) -> bool {
        let removed = self.points.write().await.remove(&id).is_some();
        debug!(id, removed, "memory delete");
        removed
    }
}

fn score(distance: DistanceKind, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        DistanceKind::Cosine => cosine(a, b),
        DistanceKind::Dot => dot(a, b),
        DistanceKind::Euclid => -a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity; zero vectors score 0.
fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let na = dot(a, a).sqrt();
    let nb = dot(b, b).sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::text_payload;

    fn index() -> MemoryIndex {
        MemoryIndex::new(VectorSpace::cosine(2))
    }

    #[tokio::test]
    async fn search_orders_by_descending_score_and_truncates() {
        let idx = index();
        idx.upsert(1, vec![1.0, 0.0], text_payload("east")).await.unwrap();
        idx.upsert(2, vec![0.0, 1.0], text_payload("north")).await.unwrap();
        idx.upsert(3, vec![0.7, 0.7], text_payload("north-east")).await.unwrap();

        let hits = idx.search(vec![1.0, 0.1], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[1].id, 3);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn fewer_hits_than_k_when_index_is_small() {
        let idx = index();
        assert!(idx.search(vec![1.0, 0.0], 3).await.unwrap().is_empty());
        idx.upsert(9, vec![1.0, 0.0], text_payload("only")).await.unwrap();
        assert_eq!(idx.search(vec![1.0, 0.0], 3).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let idx = index();
        let err = idx.upsert(1, vec![1.0], Payload::new()).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::VectorSizeMismatch { got: 1, want: 2 }));
        assert!(idx.is_empty().await);
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let idx = index();
        idx.upsert(4, vec![1.0, 0.0], text_payload("gone soon")).await.unwrap();
        assert!(idx.delete(4).await);
        assert!(!idx.delete(4).await);
        assert_eq!(idx.len().await, 0);
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
