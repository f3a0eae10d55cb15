use futures::future::BoxFuture;
use git_host::{GitHubClient, PullState, PullSummary};

use crate::contracts::{CommentPoster, PullRequestSource};
use crate::errors::{PostError, SourceError};
use crate::model::PullRequestRecord;

impl CommentPoster for GitHubClient {
    fn post<'a>(&'a self, pr_id: u64, body: &'a str) -> BoxFuture<'a, Result<(), PostError>> {
        Box::pin(async move {
            self.post_issue_comment(pr_id, body).await?;
            Ok(())
        })
    }
}

/// A PR created without a description lists with a `null` body.
impl From<PullSummary> for PullRequestRecord {
    fn from(p: PullSummary) -> Self {
        PullRequestRecord {
            id: p.number,
            title: p.title,
            body: p.body.unwrap_or_default(),
            diff_url: p.diff_url,
        }
    }
}

impl PullRequestSource for GitHubClient {
    fn list<'a>(
        &'a self,
        state: PullState,
        limit: Option<usize>,
    ) -> BoxFuture<'a, Result<Vec<PullRequestRecord>, SourceError>> {
        Box::pin(async move {
            let pulls = self.list_pulls(state, limit).await?;
            Ok(pulls.into_iter().map(PullRequestRecord::from).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_entry_becomes_record_with_empty_body() {
        let summary: PullSummary = serde_json::from_value(serde_json::json!({
            "number": 42,
            "title": "Bump deps",
            "body": null,
            "state": "closed",
            "diff_url": "https://github.com/octo/widgets/pull/42.diff"
        }))
        .unwrap();

        let record = PullRequestRecord::from(summary);
        assert_eq!(record.id, 42);
        assert_eq!(record.full_text(), "Title: Bump deps\n\n");
        assert_eq!(record.diff_url, "https://github.com/octo/widgets/pull/42.diff");
    }
}
