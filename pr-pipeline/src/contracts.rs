//! Capabilities the orchestrator depends on.
//!
//! Each is injected as `Arc<dyn ...>`; concrete bindings live in
//! [`crate::adapters`], fakes in `testing`.

use futures::future::BoxFuture;
use git_host::PullState;

use crate::errors::{EmbeddingError, IndexError, PostError, SourceError};
use crate::model::{PullRequestRecord, SimilarityHit};
use crate::summary::Summary;

/// Turns PR text into a fixed-length vector.
pub trait Embedder: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, EmbeddingError>>;
}

/// Nearest-neighbour store keyed by PR number.
pub trait SimilarityIndex: Send + Sync {
    /// Up to `k` hits, highest score first.
    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<SimilarityHit>, IndexError>>;

    /// Stores `vector` with payload `{"text": text}` under `id`; last write wins.
    fn upsert<'a>(
        &'a self,
        id: u64,
        vector: &'a [f32],
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), IndexError>>;
}

/// Produces a summary of `text` given similar past PR texts.
///
/// Never fails: provider errors come back as [`Summary::Failed`].
pub trait Summarizer: Send + Sync {
    fn summarize<'a>(&'a self, text: &'a str, context: &'a [String]) -> BoxFuture<'a, Summary>;
}

/// Posts a comment on a pull request.
pub trait CommentPoster: Send + Sync {
    fn post<'a>(&'a self, pr_id: u64, body: &'a str) -> BoxFuture<'a, Result<(), PostError>>;
}

/// Lists existing pull requests for history backfill, most recently
/// updated first.
pub trait PullRequestSource: Send + Sync {
    fn list<'a>(
        &'a self,
        state: PullState,
        limit: Option<usize>,
    ) -> BoxFuture<'a, Result<Vec<PullRequestRecord>, SourceError>>;
}
