//! Seeds the similarity index with pull requests opened before the webhook
//! was installed.
//!
//! Each listed PR is embedded and upserted exactly like the last step of a
//! webhook run, without summarizing or commenting. A PR that fails to embed
//! or store is logged and skipped; only a failed listing aborts the batch.

use std::{sync::Arc, time::Instant};

use futures::stream::{self, StreamExt};
use git_host::PullState;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::contracts::{Embedder, PullRequestSource, SimilarityIndex};
use crate::errors::SourceError;
use crate::model::PullRequestRecord;

pub const DEFAULT_CONCURRENCY: usize = 4;

/// A PR left out of the index, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPr {
    pub id: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// PRs returned by the source.
    pub listed: usize,
    /// PRs embedded and upserted.
    pub stored: usize,
    /// Sorted by PR number.
    pub skipped: Vec<SkippedPr>,
}

pub struct Backfiller {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn SimilarityIndex>,
    source: Arc<dyn PullRequestSource>,
    concurrency: usize,
}

impl Backfiller {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn SimilarityIndex>,
        source: Arc<dyn PullRequestSource>,
    ) -> Self {
        Self {
            embedder,
            index,
            source,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Maximum PRs embedded at once; `0` is treated as `1`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Lists PRs in `state` (at most `limit`) and indexes each one.
    #[instrument(skip(self), fields(concurrency = self.concurrency))]
    pub async fn run(
        &self,
        state: PullState,
        limit: Option<usize>,
    ) -> Result<BackfillReport, SourceError> {
        let started = Instant::now();
        let prs = self.source.list(state, limit).await.map_err(|e| {
            error!(error = %e, "listing pull requests failed");
            e
        })?;
        let listed = prs.len();
        info!(listed, "backfill started");

        let results: Vec<Result<u64, SkippedPr>> = stream::iter(prs)
            .map(|pr| async move { self.ingest(&pr).await.map(|()| pr.id) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = BackfillReport {
            listed,
            ..BackfillReport::default()
        };
        for result in results {
            match result {
                Ok(_) => report.stored += 1,
                Err(skipped) => report.skipped.push(skipped),
            }
        }
        report.skipped.sort_by_key(|s| s.id);

        info!(
            listed,
            stored = report.stored,
            skipped = report.skipped.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "backfill finished"
        );
        Ok(report)
    }

    async fn ingest(&self, pr: &PullRequestRecord) -> Result<(), SkippedPr> {
        let text = pr.full_text();
        let skip = |reason: String| SkippedPr { id: pr.id, reason };

        let vector = self.embedder.embed(&text).await.map_err(|e| {
            error!(pr_id = pr.id, error = %e, "backfill embedding failed; skipping");
            skip(e.to_string())
        })?;

        self.index
            .upsert(pr.id, &vector, &text)
            .await
            .map_err(|e| {
                error!(pr_id = pr.id, error = %e, "backfill upsert failed; skipping");
                skip(e.to_string())
            })?;

        debug!(pr_id = pr.id, dim = vector.len(), "backfilled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEmbedder, FakeIndex, FakeSource, record};
    use pr_index::{IndexBackend, IndexConfig, PrIndex};

    fn backfiller(
        embedder: FakeEmbedder,
        index: Arc<dyn SimilarityIndex>,
        source: FakeSource,
    ) -> Backfiller {
        Backfiller::new(Arc::new(embedder), index, Arc::new(source))
    }

    #[tokio::test]
    async fn stores_every_listed_pr() {
        let index = Arc::new(FakeIndex::default());
        let source = FakeSource::listing(vec![record(1, "First", "a"), record(2, "Second", "")]);
        let report = backfiller(FakeEmbedder::returning(vec![1.0, 0.0]), index.clone(), source)
            .run(PullState::All, None)
            .await
            .unwrap();

        assert_eq!(report.listed, 2);
        assert_eq!(report.stored, 2);
        assert!(report.skipped.is_empty());

        let mut upserts = index.upserts();
        upserts.sort();
        assert_eq!(
            upserts,
            vec![
                (1, "Title: First\n\na".to_string()),
                (2, "Title: Second\n\n".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn embedding_failure_skips_only_that_pr() {
        let index = Arc::new(FakeIndex::default());
        let source = FakeSource::listing(vec![
            record(1, "Fine", "ok"),
            record(2, "Broken", "poison"),
            record(3, "Also fine", "ok"),
        ]);
        let embedder = FakeEmbedder::returning(vec![1.0, 0.0]).failing_on("poison");

        let report = backfiller(embedder, index.clone(), source)
            .with_concurrency(2)
            .run(PullState::Closed, None)
            .await
            .unwrap();

        assert_eq!(report.listed, 3);
        assert_eq!(report.stored, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].id, 2);
        assert!(report.skipped[0].reason.contains("poison"));
        assert!(index.upserts().iter().all(|(id, _)| *id != 2));
    }

    #[tokio::test]
    async fn upsert_failure_is_reported_per_pr() {
        let index = Arc::new(FakeIndex::default().failing_upsert());
        let source = FakeSource::listing(vec![record(5, "A", "x"), record(4, "B", "y")]);

        let report = backfiller(FakeEmbedder::returning(vec![1.0]), index, source)
            .run(PullState::All, None)
            .await
            .unwrap();

        assert_eq!(report.stored, 0);
        let ids: Vec<u64> = report.skipped.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[tokio::test]
    async fn listing_failure_aborts_before_embedding() {
        let embedder = Arc::new(FakeEmbedder::returning(vec![1.0]));
        let index = Arc::new(FakeIndex::default());
        let filler = Backfiller::new(
            embedder.clone(),
            index.clone(),
            Arc::new(FakeSource::failing("rate limited")),
        );

        let err = filler.run(PullState::Open, Some(10)).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        assert_eq!(embedder.calls(), 0);
        assert!(index.upserts().is_empty());
    }

    #[tokio::test]
    async fn forwards_state_and_limit_to_the_source() {
        let source = Arc::new(FakeSource::listing(vec![
            record(1, "a", ""),
            record(2, "b", ""),
            record(3, "c", ""),
        ]));
        let filler = Backfiller::new(
            Arc::new(FakeEmbedder::returning(vec![1.0])),
            Arc::new(FakeIndex::default()),
            source.clone(),
        );

        let report = filler.run(PullState::Closed, Some(2)).await.unwrap();
        assert_eq!(report.listed, 2);
        assert_eq!(source.requests(), vec![(PullState::Closed, Some(2))]);
    }

    #[tokio::test]
    async fn backfilled_prs_are_searchable_in_memory_index() {
        let mut cfg = IndexConfig::new_default("http://localhost:6334", "pr_cache", 2);
        cfg.backend = IndexBackend::Memory;
        let index = Arc::new(PrIndex::new(&cfg).unwrap());
        let source = FakeSource::listing(vec![record(11, "Cache layer", "adds LRU")]);

        let report = backfiller(FakeEmbedder::returning(vec![0.6, 0.8]), index.clone(), source)
            .run(PullState::All, None)
            .await
            .unwrap();
        assert_eq!(report.stored, 1);

        let hits = SimilarityIndex::search(index.as_ref(), &[0.6, 0.8], 3)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 11);
        assert_eq!(hits[0].text(), Some("Title: Cache layer\n\nadds LRU"));
    }
}
