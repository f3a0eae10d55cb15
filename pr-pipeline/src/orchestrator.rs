//! Drives one PR through embed → search → summarize → {post, upsert}.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tracing::{error, info, instrument, warn};

use crate::contracts::{CommentPoster, Embedder, SimilarityIndex, Summarizer};
use crate::errors::PipelineError;
use crate::model::{PipelineOutcome, PipelineStatus, PullRequestRecord};

/// Collaborators, constructed once per process.
#[derive(Clone)]
pub struct PipelineDeps {
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn SimilarityIndex>,
    pub summarizer: Arc<dyn Summarizer>,
    pub poster: Arc<dyn CommentPoster>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// `k` for the similarity search.
    pub similar_limit: usize,
    /// Post the failure notice when summarization failed.
    pub post_failed_summaries: bool,
    /// Echo the vector back in the outcome.
    pub return_embedding: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            similar_limit: 3,
            post_failed_summaries: true,
            return_embedding: false,
        }
    }
}

/// Process-wide counters of failures the outcome does not surface.
#[derive(Debug, Default)]
pub struct PipelineStats {
    search_failures: AtomicU64,
    comment_failures: AtomicU64,
    upsert_failures: AtomicU64,
    failed_summaries: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub search_failures: u64,
    pub comment_failures: u64,
    pub upsert_failures: u64,
    pub failed_summaries: u64,
}

impl PipelineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            search_failures: self.search_failures.load(Ordering::Relaxed),
            comment_failures: self.comment_failures.load(Ordering::Relaxed),
            upsert_failures: self.upsert_failures.load(Ordering::Relaxed),
            failed_summaries: self.failed_summaries.load(Ordering::Relaxed),
        }
    }
}

fn bump(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::Relaxed) + 1
}

/// Stateless between runs apart from [`PipelineStats`]; share it behind an `Arc`.
pub struct Orchestrator {
    deps: PipelineDeps,
    config: PipelineConfig,
    stats: PipelineStats,
}

impl Orchestrator {
    pub fn new(deps: PipelineDeps, config: PipelineConfig) -> Self {
        Self {
            deps,
            config,
            stats: PipelineStats::default(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Runs the pipeline for one PR.
    ///
    /// # Errors
    /// Only an embedding failure is returned; in that case nothing else was
    /// called. Every later failure is folded into the outcome.
    #[instrument(skip_all, fields(pr = pr.id))]
    pub async fn process(&self, pr: &PullRequestRecord) -> Result<PipelineOutcome, PipelineError> {
        let full_text = pr.full_text();

        let embedding = self.deps.embedder.embed(&full_text).await.map_err(|e| {
            error!(pr = pr.id, error = %e, "embedding failed; aborting pipeline");
            PipelineError::from(e)
        })?;

        let hits = match self
            .deps
            .index
            .search(&embedding, self.config.similar_limit)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                let total = bump(&self.stats.search_failures);
                warn!(pr = pr.id, error = %e, search_failures = total, "similarity search failed; continuing without context");
                Vec::new()
            }
        };

        let contexts: Vec<String> = hits
            .iter()
            .filter_map(|h| h.text().map(str::to_owned))
            .collect();
        info!(pr = pr.id, hits = hits.len(), contexts = contexts.len(), "similar PRs retrieved");

        let summary = self.deps.summarizer.summarize(&full_text, &contexts).await;
        if summary.is_failed() {
            let total = bump(&self.stats.failed_summaries);
            warn!(pr = pr.id, notice = summary.text(), failed_summaries = total, "summary generation failed");
        }

        let should_post = !summary.is_failed() || self.config.post_failed_summaries;

        let post = async {
            if !should_post {
                info!(pr = pr.id, "skipping comment for failed summary");
                return false;
            }
            match self.deps.poster.post(pr.id, summary.text()).await {
                Ok(()) => true,
                Err(e) => {
                    let total = bump(&self.stats.comment_failures);
                    error!(pr = pr.id, error = %e, comment_failures = total, "failed to post comment");
                    false
                }
            }
        };

        let store = async {
            match self.deps.index.upsert(pr.id, &embedding, &full_text).await {
                Ok(()) => true,
                Err(e) => {
                    let total = bump(&self.stats.upsert_failures);
                    error!(pr = pr.id, error = %e, upsert_failures = total, "failed to store embedding");
                    false
                }
            }
        };

        let (comment_posted, embedding_stored) = futures::join!(post, store);
        let status = PipelineStatus::from_side_effects(comment_posted, embedding_stored);
        info!(pr = pr.id, ?status, comment_posted, embedding_stored, "pipeline finished");

        Ok(PipelineOutcome {
            status,
            summary: summary.text().to_string(),
            comment_posted,
            embedding_stored,
            embedding: self.config.return_embedding.then_some(embedding),
        })
    }
}
