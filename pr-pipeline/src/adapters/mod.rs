//! Bindings of the capability contracts to the workspace clients.
//!
//! - [`LlmEmbedder`] / [`LlmSummarizer`]: `ai-llm-service`
//! - `PrIndex` implements `SimilarityIndex`
//! - `GitHubClient` implements `CommentPoster` and `PullRequestSource`

mod github;
mod index;
mod llm;

pub use llm::{LlmEmbedder, LlmSummarizer, summary_failure};
