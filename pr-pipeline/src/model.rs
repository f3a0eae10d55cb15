//! Data carried through one pipeline run.

use serde::Serialize;
use serde_json::Value;

use crate::errors::RecordError;

/// Payload stored next to a vector, at least `{"text": ...}`.
pub type HitPayload = serde_json::Map<String, Value>;

/// Pull request as received from the webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    /// Host-assigned PR number, unique per repository.
    pub id: u64,
    pub title: String,
    /// May be empty, never absent.
    pub body: String,
    pub diff_url: String,
}

impl PullRequestRecord {
    /// Builds a record from the webhook's `pull_request` object.
    ///
    /// `title`, `body`, `number` and `diff_url` must all be present with the
    /// right JSON type; `null` counts as missing.
    pub fn from_webhook(pr: &Value) -> Result<Self, RecordError> {
        let field = |name: &'static str| pr.get(name).filter(|v| !v.is_null());

        let title = field("title").and_then(Value::as_str);
        let body = field("body").and_then(Value::as_str);
        let number = field("number").and_then(Value::as_u64);
        let diff_url = field("diff_url").and_then(Value::as_str);

        match (number, title, body, diff_url) {
            (Some(id), Some(title), Some(body), Some(diff_url)) => Ok(Self {
                id,
                title: title.to_string(),
                body: body.to_string(),
                diff_url: diff_url.to_string(),
            }),
            _ => {
                let missing = [
                    ("title", title.is_none()),
                    ("body", body.is_none()),
                    ("number", number.is_none()),
                    ("diff_url", diff_url.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(RecordError::MissingFields(missing))
            }
        }
    }

    /// Text that gets embedded, indexed and summarized.
    pub fn full_text(&self) -> String {
        format!("Title: {}\n\n{}", self.title, self.body)
    }
}

/// One similar past PR returned by the index.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityHit {
    pub id: u64,
    /// Higher is more similar.
    pub score: f32,
    pub payload: HitPayload,
}

impl SimilarityHit {
    /// Stored PR text; `None` when the payload has no string `"text"`.
    pub fn text(&self) -> Option<&str> {
        self.payload.get("text").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Processed,
    PartiallyProcessed,
    Error,
}

impl PipelineStatus {
    /// `processed` only when both side effects succeeded.
    pub fn from_side_effects(comment_posted: bool, embedding_stored: bool) -> Self {
        if comment_posted && embedding_stored {
            PipelineStatus::Processed
        } else {
            PipelineStatus::PartiallyProcessed
        }
    }
}

/// Result of a run whose embedding step succeeded; serialized as the
/// webhook response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    pub status: PipelineStatus,
    pub summary: String,
    pub comment_posted: bool,
    pub embedding_stored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}
