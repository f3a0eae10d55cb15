//! In-memory fakes of every capability, recording the calls they receive.

use std::sync::{
    Mutex, MutexGuard,
    atomic::{AtomicUsize, Ordering},
};

use futures::future::BoxFuture;
use git_host::PullState;
use serde_json::Value;

use crate::contracts::{CommentPoster, Embedder, PullRequestSource, SimilarityIndex, Summarizer};
use crate::errors::{EmbeddingError, IndexError, PostError, SourceError};
use crate::model::{HitPayload, PullRequestRecord, SimilarityHit};
use crate::summary::{Summary, SummaryFailure};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct FakeEmbedder {
    result: Result<Vec<f32>, String>,
    fail_on: Option<String>,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn returning(vector: Vec<f32>) -> Self {
        Self {
            result: Ok(vector),
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails only for texts containing `needle`.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for FakeEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, EmbeddingError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let out = match &self.fail_on {
            Some(needle) if text.contains(needle.as_str()) => {
                Err(format!("refused text containing {needle:?}"))
            }
            _ => self.result.clone(),
        }
        .map_err(EmbeddingError::Unavailable);
        Box::pin(async move { out })
    }
}

#[derive(Default)]
pub struct FakeIndex {
    hits: Vec<SimilarityHit>,
    fail_search: bool,
    fail_upsert: bool,
    searches: Mutex<Vec<usize>>,
    upserts: Mutex<Vec<(u64, String)>>,
}

impl FakeIndex {
    /// Adds hits with `{"text": ...}` payloads, scored in the given order.
    pub fn with_hits(mut self, hits: &[(u64, &str)]) -> Self {
        for (id, text) in hits {
            let mut payload = HitPayload::new();
            payload.insert("text".into(), Value::String((*text).to_string()));
            self.push_hit(*id, payload);
        }
        self
    }

    /// Adds a hit with an arbitrary payload object.
    pub fn with_payload_hit(mut self, id: u64, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            _ => HitPayload::new(),
        };
        self.push_hit(id, payload);
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub fn failing_upsert(mut self) -> Self {
        self.fail_upsert = true;
        self
    }

    fn push_hit(&mut self, id: u64, payload: HitPayload) {
        let score = 1.0 - 0.1 * self.hits.len() as f32;
        self.hits.push(SimilarityHit { id, score, payload });
    }

    /// `k` of every search call, in order.
    pub fn search_calls(&self) -> Vec<usize> {
        lock(&self.searches).clone()
    }

    /// `(id, text)` of every upsert call, in order.
    pub fn upserts(&self) -> Vec<(u64, String)> {
        lock(&self.upserts).clone()
    }
}

impl SimilarityIndex for FakeIndex {
    fn search<'a>(
        &'a self,
        _vector: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<SimilarityHit>, IndexError>> {
        lock(&self.searches).push(k);
        let out = if self.fail_search {
            Err(IndexError::Unavailable("search refused".into()))
        } else {
            Ok(self.hits.iter().take(k).cloned().collect())
        };
        Box::pin(async move { out })
    }

    fn upsert<'a>(
        &'a self,
        id: u64,
        _vector: &'a [f32],
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), IndexError>> {
        lock(&self.upserts).push((id, text.to_string()));
        let out = if self.fail_upsert {
            Err(IndexError::Unavailable("upsert refused".into()))
        } else {
            Ok(())
        };
        Box::pin(async move { out })
    }
}

pub struct FakeSummarizer {
    summary: Summary,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeSummarizer {
    pub fn generated(text: &str) -> Self {
        Self {
            summary: Summary::Generated(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failed(failure: SummaryFailure) -> Self {
        Self {
            summary: Summary::Failed(failure),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(text, context)` of the most recent call.
    pub fn last_call(&self) -> Option<(String, Vec<String>)> {
        lock(&self.calls).last().cloned()
    }
}

impl Summarizer for FakeSummarizer {
    fn summarize<'a>(&'a self, text: &'a str, context: &'a [String]) -> BoxFuture<'a, Summary> {
        lock(&self.calls).push((text.to_string(), context.to_vec()));
        let out = self.summary.clone();
        Box::pin(async move { out })
    }
}

#[derive(Default)]
pub struct FakePoster {
    fail: bool,
    posted: Mutex<Vec<(u64, String)>>,
}

impl FakePoster {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Comments accepted so far.
    pub fn posted(&self) -> Vec<(u64, String)> {
        lock(&self.posted).clone()
    }
}

impl CommentPoster for FakePoster {
    fn post<'a>(&'a self, pr_id: u64, body: &'a str) -> BoxFuture<'a, Result<(), PostError>> {
        let out = if self.fail {
            Err(PostError::Rejected("post refused".into()))
        } else {
            lock(&self.posted).push((pr_id, body.to_string()));
            Ok(())
        };
        Box::pin(async move { out })
    }
}

/// Record with a diff URL derived from `id`.
pub fn record(id: u64, title: &str, body: &str) -> PullRequestRecord {
    PullRequestRecord {
        id,
        title: title.to_string(),
        body: body.to_string(),
        diff_url: format!("https://github.com/octo/widgets/pull/{id}.diff"),
    }
}

pub struct FakeSource {
    result: Result<Vec<PullRequestRecord>, String>,
    requests: Mutex<Vec<(PullState, Option<usize>)>>,
}

impl FakeSource {
    pub fn listing(records: Vec<PullRequestRecord>) -> Self {
        Self {
            result: Ok(records),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// `(state, limit)` of every list call, in order.
    pub fn requests(&self) -> Vec<(PullState, Option<usize>)> {
        lock(&self.requests).clone()
    }
}

impl PullRequestSource for FakeSource {
    fn list<'a>(
        &'a self,
        state: PullState,
        limit: Option<usize>,
    ) -> BoxFuture<'a, Result<Vec<PullRequestRecord>, SourceError>> {
        lock(&self.requests).push((state, limit));
        let out = match &self.result {
            Ok(records) => Ok(records
                .iter()
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect()),
            Err(reason) => Err(SourceError::Unavailable(reason.clone())),
        };
        Box::pin(async move { out })
    }
}
