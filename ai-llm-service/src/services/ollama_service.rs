//! Lightweight Ollama service for chat and embeddings.
//!
//! This module implements a thin client for a local Ollama daemon:
//! - `POST {endpoint}/v1/chat/completions`: OpenAI-compatible chat route
//! - `POST {endpoint}/api/embed`          : native embeddings route
//!
//! Some Ollama builds answer the chat route with the native shape
//! (`{"message": {...}}`) instead of `choices[]`; both are accepted.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    services::{
        ensure_success, normalize_endpoint,
        open_ai_service::{ChatCompletionRequest, ChatCompletionResponse, ChatMessageOut},
    },
};

/// Thin client for the Ollama API.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_chat: String,
    url_embed: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`].
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not Ollama
    /// - `InvalidEndpoint` if the endpoint is empty or lacks a scheme
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let base = normalize_endpoint(Provider::Ollama, &cfg.endpoint)?;
        let timeout = cfg.timeout();

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AiLlmError::HttpTransport)?;

        info!(model = %cfg.model, endpoint = %base, "OllamaService initialized");

        Ok(Self {
            client,
            url_chat: format!("{base}/v1/chat/completions"),
            url_embed: format!("{base}/api/embed"),
            cfg,
            timeout,
        })
    }

    /// Runs a non-streaming chat completion and returns the trimmed text.
    ///
    /// # Errors
    /// Same mapping as the OpenAI client; `EmptyCompletion` if neither
    /// response shape carries text.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt, system);

        debug!(prompt_len = prompt.len(), "POST {}", self.url_chat);

        let resp = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;
        let resp = ensure_success(Provider::Ollama, resp, &self.url_chat).await?;

        let out: OllamaChatResponse = resp.json().await.map_err(|e| {
            error!(error = %e, "failed to decode Ollama chat response");
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!("serde error: {e}")),
            )
        })?;

        let content = out
            .into_content()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::new(Provider::Ollama, ProviderErrorKind::EmptyCompletion))?;

        info!(
            latency_ms = started.elapsed().as_millis() as u64,
            "chat completion completed"
        );
        Ok(content)
    }

    /// Returns the embedding vector for `input`.
    ///
    /// # Errors
    /// `Decode` if the response carries no vector.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let started = Instant::now();
        let body = EmbedRequest {
            model: &self.cfg.model,
            input,
        };

        debug!(input_len = input.len(), "POST {}", self.url_embed);

        let resp = self
            .client
            .post(&self.url_embed)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;
        let resp = ensure_success(Provider::Ollama, resp, &self.url_embed).await?;

        let out: EmbedResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `embeddings[0]`")),
            )
        })?;

        let vector = out
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ProviderError::new(
                    Provider::Ollama,
                    ProviderErrorKind::Decode("empty `embeddings` in response".into()),
                )
            })?;

        info!(
            dim = vector.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "embeddings completed"
        );
        Ok(vector)
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Either the OpenAI-compatible shape or Ollama's native chat shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OllamaChatResponse {
    Compat(ChatCompletionResponse),
    Native { message: ChatMessageOut },
}

impl OllamaChatResponse {
    fn into_content(self) -> Option<String> {
        match self {
            OllamaChatResponse::Compat(r) => r.choices.into_iter().find_map(|c| c.message.content),
            OllamaChatResponse::Native { message } => message.content,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}
