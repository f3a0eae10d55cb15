//! Embedder and Summarizer backed by [`LlmServiceProfiles`].

use std::sync::Arc;

use ai_llm_service::{AiLlmError, LlmServiceProfiles, ProviderError, ProviderErrorKind};
use futures::future::BoxFuture;
use tracing::{error, warn};

use crate::contracts::{Embedder, Summarizer};
use crate::errors::EmbeddingError;
use crate::prompt::{SYSTEM_PROMPT, build_prompt};
use crate::summary::{Summary, SummaryFailure};

/// Embedding profile of the LLM service, checked against the index dimension.
#[derive(Clone)]
pub struct LlmEmbedder {
    svc: Arc<LlmServiceProfiles>,
    dim: usize,
}

impl LlmEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: usize) -> Self {
        Self { svc, dim }
    }
}

impl Embedder for LlmEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, EmbeddingError>> {
        Box::pin(async move {
            let vector = self.svc.embed(text).await?;
            if vector.len() != self.dim {
                error!(got = vector.len(), want = self.dim, "embedding dimension mismatch");
                return Err(EmbeddingError::Dimension {
                    got: vector.len(),
                    want: self.dim,
                });
            }
            Ok(vector)
        })
    }
}

/// Chat profile of the LLM service with the PR prompt.
#[derive(Clone)]
pub struct LlmSummarizer {
    svc: Arc<LlmServiceProfiles>,
}

impl LlmSummarizer {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl Summarizer for LlmSummarizer {
    fn summarize<'a>(&'a self, text: &'a str, context: &'a [String]) -> BoxFuture<'a, Summary> {
        Box::pin(async move {
            let prompt = build_prompt(text, context);
            match self.svc.generate_chat(&prompt, Some(SYSTEM_PROMPT)).await {
                Ok(summary) => Summary::Generated(summary),
                Err(e) => {
                    let failure = summary_failure(&e);
                    warn!(error = %e, ?failure, "LLM summary failed");
                    Summary::Failed(failure)
                }
            }
        })
    }
}

/// Buckets a provider error into the notice shown to users.
pub fn summary_failure(err: &AiLlmError) -> SummaryFailure {
    match err {
        AiLlmError::Timeout(_) => SummaryFailure::Timeout,
        AiLlmError::HttpTransport(_) => SummaryFailure::ApiError,
        AiLlmError::Provider(ProviderError { kind, .. }) => match kind {
            ProviderErrorKind::RateLimited { .. } => SummaryFailure::RateLimited,
            ProviderErrorKind::HttpStatus(_) => SummaryFailure::ApiError,
            ProviderErrorKind::EmptyCompletion => SummaryFailure::EmptyResponse,
            ProviderErrorKind::Decode(_) => SummaryFailure::UnexpectedResponse,
            _ => SummaryFailure::Other,
        },
        _ => SummaryFailure::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::{
        ConfigError, LlmModelConfig, LlmProvider, RetryPolicy, error_handler::Provider,
    };
    use std::time::Duration;

    /// Profiles pointing at a port nothing listens on.
    fn unreachable_profiles() -> Arc<LlmServiceProfiles> {
        let cfg = |model: &str| LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://127.0.0.1:9".into(),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.2),
            timeout_secs: Some(5),
        };
        Arc::new(
            LlmServiceProfiles::new(cfg("llama2"), cfg("nomic-embed-text"), RetryPolicy::none())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn unreachable_provider_yields_failed_summary() {
        let summarizer = LlmSummarizer::new(unreachable_profiles());
        let context = vec!["Similar PR 1".to_string()];

        let summary = summarizer
            .summarize("Title: Test PR\n\nTest description", &context)
            .await;

        assert_eq!(summary, Summary::Failed(SummaryFailure::ApiError));
        assert_eq!(summary.text(), "[Error: API error occurred.]");
    }

    #[tokio::test]
    async fn unreachable_provider_is_an_embedding_error() {
        let embedder = LlmEmbedder::new(unreachable_profiles(), 768);
        assert!(matches!(
            embedder.embed("Title: Test PR\n\n").await,
            Err(EmbeddingError::Provider(_))
        ));
    }

    fn provider(kind: ProviderErrorKind) -> AiLlmError {
        ProviderError::new(Provider::OpenAI, kind).into()
    }

    #[test]
    fn provider_errors_map_to_distinct_notices() {
        assert_eq!(
            summary_failure(&provider(ProviderErrorKind::RateLimited { retry_after: None })),
            SummaryFailure::RateLimited
        );
        assert_eq!(
            summary_failure(&AiLlmError::Timeout(Duration::from_secs(60))),
            SummaryFailure::Timeout
        );
        assert_eq!(
            summary_failure(&provider(ProviderErrorKind::EmptyCompletion)),
            SummaryFailure::EmptyResponse
        );
        assert_eq!(
            summary_failure(&provider(ProviderErrorKind::Decode("x".into()))),
            SummaryFailure::UnexpectedResponse
        );
        assert_eq!(
            summary_failure(&provider(ProviderErrorKind::MissingApiKey)),
            SummaryFailure::Other
        );
        assert_eq!(
            summary_failure(&ConfigError::EmptyModel.into()),
            SummaryFailure::Other
        );
    }
}
