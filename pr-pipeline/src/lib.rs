//! Retrieval-augmented summarization of pull requests.
//!
//! For every PR event the [`Orchestrator`]:
//! 1. embeds `"Title: {title}\n\n{body}"` (a failure here aborts the run),
//! 2. looks up similar past PRs (failures degrade to no context),
//! 3. asks the LLM for a summary (failures become a notice, never an error),
//! 4. posts the summary and stores the embedding, both always attempted.
//!
//! Collaborators are injected through the traits in [`contracts`].
//! [`Backfiller`] seeds the index from PRs that predate the webhook.

pub mod adapters;
pub mod backfill;
pub mod contracts;
pub mod errors;
pub mod model;
pub mod orchestrator;
pub mod prompt;
pub mod summary;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backfill::{BackfillReport, Backfiller, SkippedPr};
pub use contracts::{CommentPoster, Embedder, PullRequestSource, SimilarityIndex, Summarizer};
pub use errors::{EmbeddingError, IndexError, PipelineError, PostError, RecordError, SourceError};
pub use model::{PipelineOutcome, PipelineStatus, PullRequestRecord, SimilarityHit};
pub use orchestrator::{Orchestrator, PipelineConfig, PipelineDeps, StatsSnapshot};
pub use summary::{Summary, SummaryFailure};
