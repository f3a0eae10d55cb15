//! [`SimilarityIndex`] over [`PrIndex`].

use futures::future::BoxFuture;
use pr_index::{IndexHit, PrIndex, text_payload};

use crate::contracts::SimilarityIndex;
use crate::errors::IndexError;
use crate::model::SimilarityHit;

impl From<IndexHit> for SimilarityHit {
    fn from(h: IndexHit) -> Self {
        SimilarityHit {
            id: h.id,
            score: h.score,
            payload: h.payload,
        }
    }
}

impl SimilarityIndex for PrIndex {
    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<SimilarityHit>, IndexError>> {
        Box::pin(async move {
            let hits = PrIndex::search(self, vector.to_vec(), k as u64).await?;
            Ok(hits.into_iter().map(SimilarityHit::from).collect())
        })
    }

    fn upsert<'a>(
        &'a self,
        id: u64,
        vector: &'a [f32],
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), IndexError>> {
        Box::pin(async move {
            PrIndex::upsert(self, id, vector.to_vec(), text_payload(text)).await?;
            Ok(())
        })
    }
}
