//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// Stored metadata of a point, e.g. `{"text": "Title: ...\n\n..."}`.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// A single nearest-neighbour hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    /// PR number the point is keyed by.
    pub id: u64,
    /// Higher is more similar.
    pub score: f32,
    pub payload: Payload,
}

impl IndexHit {
    /// The stored `"text"` field, if present and a string.
    pub fn text(&self) -> Option<&str> {
        self.payload.get("text").and_then(|v| v.as_str())
    }
}

/// Builds the canonical payload stored for a PR.
pub fn text_payload(text: impl Into<String>) -> Payload {
    let mut p = Payload::new();
    p.insert("text".into(), serde_json::Value::String(text.into()));
    p
}
