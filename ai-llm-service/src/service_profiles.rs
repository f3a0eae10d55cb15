//! Shared LLM service with two active profiles: `chat` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Provider clients are built eagerly, so a bad profile fails at startup.
//! - Every call goes through the rate-limit [`RetryPolicy`].
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{config::default_config::settings_from, service_profiles::LlmServiceProfiles};
//!
//! # async fn run() -> Result<(), ai_llm_service::error_handler::AiLlmError> {
//! let settings = settings_from(|k| std::env::var(k).ok())?;
//! let svc = Arc::new(LlmServiceProfiles::from_settings(settings)?);
//!
//! let summary = svc.generate_chat("Summarize this PR", Some("Be brief")).await?;
//! let vector = svc.embed("Title: Fix typo\n\n").await?;
//! println!("{summary} / dim={}", vector.len());
//! # Ok(()) }
//! ```

use tracing::debug;

use crate::{
    config::{
        default_config::LlmSettings, llm_model_config::LlmModelConfig, llm_provider::LlmProvider,
    },
    error_handler::AiLlmError,
    retry::{RetryPolicy, with_retry},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// A ready-to-use client for one provider.
#[derive(Debug)]
enum ProviderClient {
    OpenAI(OpenAiService),
    Ollama(OllamaService),
}

impl ProviderClient {
    fn build(cfg: &LlmModelConfig) -> Result<Self, AiLlmError> {
        Ok(match cfg.provider {
            LlmProvider::OpenAI => ProviderClient::OpenAI(OpenAiService::new(cfg.clone())?),
            LlmProvider::Ollama => ProviderClient::Ollama(OllamaService::new(cfg.clone())?),
        })
    }
}

/// Shared service that manages the **chat** and **embedding** profiles.
#[derive(Debug)]
pub struct LlmServiceProfiles {
    chat_cfg: LlmModelConfig,
    embedding_cfg: LlmModelConfig,
    chat: ProviderClient,
    embedding: ProviderClient,
    retry: RetryPolicy,
}

impl LlmServiceProfiles {
    /// Creates the service from explicit profiles.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if either provider client rejects its config.
    pub fn new(
        chat: LlmModelConfig,
        embedding: LlmModelConfig,
        retry: RetryPolicy,
    ) -> Result<Self, AiLlmError> {
        Ok(Self {
            chat: ProviderClient::build(&chat)?,
            embedding: ProviderClient::build(&embedding)?,
            chat_cfg: chat,
            embedding_cfg: embedding,
            retry,
        })
    }

    /// Creates the service from settings resolved by [`crate::config::default_config::settings_from`].
    pub fn from_settings(settings: LlmSettings) -> Result<Self, AiLlmError> {
        Self::new(settings.chat, settings.embedding, settings.retry)
    }

    /// Generates text using the **chat** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] once retries are exhausted or on any
    /// non-throttling failure.
    pub async fn generate_chat(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, AiLlmError> {
        debug!(provider = %self.chat_cfg.provider, "generate_chat");
        let client = &self.chat;
        with_retry(&self.retry, move || async move {
            match client {
                ProviderClient::OpenAI(cli) => cli.generate(prompt, system).await,
                ProviderClient::Ollama(cli) => cli.generate(prompt, system).await,
            }
        })
        .await
    }

    /// Computes embeddings using the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if embedding fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        debug!(provider = %self.embedding_cfg.provider, "embed");
        let client = &self.embedding;
        with_retry(&self.retry, move || async move {
            match client {
                ProviderClient::OpenAI(cli) => cli.embeddings(input).await,
                ProviderClient::Ollama(cli) => cli.embeddings(input).await,
            }
        })
        .await
    }

    /// Returns references to the current profiles `(chat, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.chat_cfg, &self.embedding_cfg)
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.2),
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn builds_clients_up_front() {
        let svc =
            LlmServiceProfiles::new(ollama("llama2"), ollama("nomic-embed-text"), RetryPolicy::none())
                .unwrap();
        let (chat, emb) = svc.profiles();
        assert_eq!(chat.model, "llama2");
        assert_eq!(emb.model, "nomic-embed-text");
        assert_eq!(svc.retry_policy().max_retries, 0);
    }

    #[test]
    fn bad_endpoint_fails_at_construction() {
        let mut bad = ollama("llama2");
        bad.endpoint = "localhost".into();
        assert!(LlmServiceProfiles::new(bad, ollama("e"), RetryPolicy::default()).is_err());
    }
}
