//! GitHub provider (REST v3) for PR conversation comments.
//!
//! Endpoints used:
//!   * POST /repos/{owner}/{repo}/issues/{number}/comments
//!   * GET  /repos/{owner}/{repo}/pulls (paginated, for history backfill)
//!
//! PR conversation comments go through the issues API; the pulls
//! `comments` route is for review comments anchored to diff lines.

use std::{
    fmt,
    str::FromStr,
    time::{Duration, Instant},
};

use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::errors::{GitHostError, GitHostResult};

const USER_AGENT: &str = concat!("pr-digest/", env!("CARGO_PKG_VERSION"));

/// GitHub's maximum page size for list endpoints.
const MAX_PER_PAGE: usize = 100;

/// Settings for [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// REST base, e.g. `https://api.github.com`.
    pub base_api: String,
    /// Personal access or app installation token.
    pub token: String,
    /// `owner/repo` the webhook belongs to.
    pub repo: String,
    pub timeout: Duration,
}

/// A comment GitHub accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct PostedComment {
    pub id: u64,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// `state` filter of the pulls listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PullState {
    Open,
    Closed,
    #[default]
    All,
}

impl PullState {
    pub fn as_str(self) -> &'static str {
        match self {
            PullState::Open => "open",
            PullState::Closed => "closed",
            PullState::All => "all",
        }
    }
}

impl FromStr for PullState {
    type Err = GitHostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(PullState::Open),
            "closed" => Ok(PullState::Closed),
            "all" => Ok(PullState::All),
            other => Err(GitHostError::Validation(format!(
                "unknown pull request state '{other}', expected open, closed or all"
            ))),
        }
    }
}

impl fmt::Display for PullState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the pulls listing; only the fields the digest needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullSummary {
    pub number: u64,
    pub title: String,
    /// `null` when the PR has no description.
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    pub diff_url: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// GitHub HTTP client wrapper bound to one repository.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Validates the config and builds an HTTP client with auth headers.
    pub fn new(cfg: GitHubConfig) -> GitHostResult<Self> {
        let token = cfg.token.trim();
        if token.is_empty() {
            return Err(GitHostError::Config("missing GitHub token".into()));
        }
        let base_api = cfg.base_api.trim().trim_end_matches('/').to_string();
        if !(base_api.starts_with("https://") || base_api.starts_with("http://")) {
            return Err(GitHostError::Config(format!(
                "invalid base api url: {base_api}"
            )));
        }
        let (owner, repo) = split_owner_repo(&cfg.repo)?;

        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| GitHostError::Config(format!("invalid token header: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );

        let http = Client::builder()
            .timeout(cfg.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| GitHostError::Config(format!("http client: {e}")))?;

        debug!(base_api = %base_api, owner = %owner, repo = %repo, "GitHubClient created");
        Ok(Self {
            http,
            base_api,
            owner,
            repo,
        })
    }

    /// `owner/repo` this client posts to.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn issue_comments_url(&self, number: u64) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.base_api, self.owner, self.repo, number
        )
    }

    fn pulls_url(&self) -> String {
        format!("{}/repos/{}/{}/pulls", self.base_api, self.owner, self.repo)
    }

    /// Lists pull requests, most recently updated first.
    ///
    /// Follows pages until GitHub returns a short page or `limit` entries
    /// have been collected. `limit = Some(0)` returns nothing without a
    /// request.
    pub async fn list_pulls(
        &self,
        state: PullState,
        limit: Option<usize>,
    ) -> GitHostResult<Vec<PullSummary>> {
        let per_page = limit.map_or(MAX_PER_PAGE, |l| l.clamp(1, MAX_PER_PAGE));
        let url = self.pulls_url();
        let mut pulls: Vec<PullSummary> = Vec::new();
        let mut page = 1usize;

        while limit.is_none_or(|l| pulls.len() < l) {
            let started = Instant::now();
            debug!(%state, page, per_page, "GitHub list_pulls: {}", url);

            let resp = self
                .http
                .get(&url)
                .query(&[
                    ("state", state.as_str()),
                    ("sort", "updated"),
                    ("direction", "desc"),
                ])
                .query(&[("per_page", per_page), ("page", page)])
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let err = GitHostError::from_status(status, Some(resp.headers()));
                error!(page, %status, error = %err, "GitHub rejected pulls listing");
                return Err(err);
            }

            let batch: Vec<PullSummary> = resp.json().await?;
            let fetched = batch.len();
            pulls.extend(batch);
            info!(
                page,
                fetched,
                total = pulls.len(),
                latency_ms = started.elapsed().as_millis() as u64,
                "pulls page fetched"
            );

            if fetched < per_page {
                break;
            }
            page += 1;
        }

        if let Some(l) = limit {
            pulls.truncate(l);
        }
        Ok(pulls)
    }

    /// Posts `body` as a conversation comment on PR `number`.
    pub async fn post_issue_comment(&self, number: u64, body: &str) -> GitHostResult<PostedComment> {
        if number == 0 {
            return Err(GitHostError::Validation("PR number must be > 0".into()));
        }
        if body.trim().is_empty() {
            return Err(GitHostError::Validation("comment body is empty".into()));
        }

        let url = self.issue_comments_url(number);
        let started = Instant::now();
        debug!(number, body_len = body.len(), "GitHub post_issue_comment: {}", url);

        let resp = self
            .http
            .post(&url)
            .json(&CommentCreate { body })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let err = GitHostError::from_status(status, Some(resp.headers()));
            error!(number, %status, error = %err, "GitHub rejected comment");
            return Err(err);
        }

        let posted: PostedComment = resp.json().await?;
        info!(
            number,
            comment_id = posted.id,
            latency_ms = started.elapsed().as_millis() as u64,
            "comment posted"
        );
        Ok(posted)
    }
}

#[derive(Debug, Serialize)]
struct CommentCreate<'a> {
    body: &'a str,
}

/// Splits `owner/repo` into its two parts.
pub fn split_owner_repo(project: &str) -> GitHostResult<(String, String)> {
    let mut parts = project.split('/');
    let owner = parts.next().unwrap_or("").trim();
    let repo = parts.next().unwrap_or("").trim();

    if owner.is_empty() || repo.is_empty() || parts.next().is_some() {
        return Err(GitHostError::Config(format!(
            "invalid GitHub repository '{project}', expected 'owner/repo'"
        )));
    }

    Ok((owner.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> GitHubConfig {
        GitHubConfig {
            base_api: "https://api.github.com/".into(),
            token: "ghp_test".into(),
            repo: "octo/widgets".into(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn splits_owner_and_repo() {
        assert_eq!(
            split_owner_repo("octo/widgets").unwrap(),
            ("octo".to_string(), "widgets".to_string())
        );
        assert!(split_owner_repo("octo").is_err());
        assert!(split_owner_repo("a/b/c").is_err());
        assert!(split_owner_repo("/b").is_err());
    }

    #[test]
    fn builds_issue_comment_url() {
        let c = GitHubClient::new(cfg()).unwrap();
        assert_eq!(
            c.issue_comments_url(123),
            "https://api.github.com/repos/octo/widgets/issues/123/comments"
        );
        assert_eq!(c.full_name(), "octo/widgets");
    }

    #[test]
    fn rejects_missing_token() {
        let mut c = cfg();
        c.token = "  ".into();
        assert!(matches!(GitHubClient::new(c), Err(GitHostError::Config(_))));
    }

    #[test]
    fn builds_pulls_url() {
        let c = GitHubClient::new(cfg()).unwrap();
        assert_eq!(c.pulls_url(), "https://api.github.com/repos/octo/widgets/pulls");
    }

    #[test]
    fn parses_pull_state() {
        assert_eq!("ALL".parse::<PullState>().unwrap(), PullState::All);
        assert_eq!(" closed".parse::<PullState>().unwrap(), PullState::Closed);
        assert_eq!(PullState::default().to_string(), "all");
        assert!(matches!(
            "merged".parse::<PullState>(),
            Err(GitHostError::Validation(_))
        ));
    }

    #[test]
    fn decodes_listing_entries_with_null_body() {
        let raw = r#"[
            {"number": 41, "title": "Add cache", "body": null, "state": "closed",
             "diff_url": "https://github.com/octo/widgets/pull/41.diff",
             "updated_at": "2024-05-01T10:00:00Z", "user": {"login": "octocat"}},
            {"number": 42, "title": "Fix typo", "body": "docs", "state": "open",
             "diff_url": "https://github.com/octo/widgets/pull/42.diff"}
        ]"#;
        let pulls: Vec<PullSummary> = serde_json::from_str(raw).unwrap();
        assert_eq!(pulls.len(), 2);
        assert_eq!(pulls[0].number, 41);
        assert_eq!(pulls[0].body, None);
        assert_eq!(pulls[1].body.as_deref(), Some("docs"));
        assert_eq!(pulls[1].updated_at, None);
    }

    #[tokio::test]
    async fn zero_limit_lists_nothing() {
        let c = GitHubClient::new(cfg()).unwrap();
        assert!(c.list_pulls(PullState::All, Some(0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn validates_before_sending() {
        let c = GitHubClient::new(cfg()).unwrap();
        assert!(matches!(
            c.post_issue_comment(1, "   ").await,
            Err(GitHostError::Validation(_))
        ));
        assert!(matches!(
            c.post_issue_comment(0, "hi").await,
            Err(GitHostError::Validation(_))
        ));
    }
}
