//! Source-control host access for the PR digest service.
//!
//! Only GitHub is supported; the client posts the generated summary back to
//! the pull request conversation and lists past pull requests for backfill.

mod errors;
pub mod github;

pub use errors::{GitHostError, GitHostResult};
pub use github::{
    GitHubClient, GitHubConfig, PostedComment, PullState, PullSummary, split_owner_repo,
};
