//! Default LLM configs resolved from environment variables.
//!
//! Two roles are supported:
//!
//! - **Chat**      → PR summarization (`LLM_PROVIDER`)
//! - **Embedding** → PR text vectors (`EMBEDDING_PROVIDER`)
//!
//! Every function takes a `lookup` closure instead of reading the process
//! environment directly; the binary passes `|k| std::env::var(k).ok()`.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_PROVIDER`       = `openai` (default) or `ollama`
//! - `EMBEDDING_PROVIDER` = `openai` (default) or `ollama`
//! - `REQUEST_TIMEOUT`    = per-request timeout in seconds (default 60)
//! - `LLM_MAX_TOKENS`     = optional completion cap
//! - `MAX_RETRIES`        = rate-limit retries (default 1)
//! - `RATE_LIMIT_DELAY`   = base backoff in seconds (default 1.0)
//!
//! OpenAI:
//! - `OPENAI_API_KEY` (required when used), `OPENAI_URL`, `OPENAI_MODEL`, `EMBEDDING_MODEL`
//!
//! Ollama:
//! - `OLLAMA_URL`, `OLLAMA_MODEL`, `EMBEDDING_MODEL`

use std::time::Duration;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{Result, must_var, parse_var_or, validate_http_endpoint, var_or},
    retry::RetryPolicy,
};

const OPENAI_URL: &str = "https://api.openai.com";
const OLLAMA_URL: &str = "http://localhost:11434";

/// Everything the service needs, resolved in one pass.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub chat: LlmModelConfig,
    pub embedding: LlmModelConfig,
    pub retry: RetryPolicy,
}

/// Resolves chat, embedding and retry settings.
///
/// # Errors
/// Returns config errors for unknown providers, malformed numbers or URLs,
/// and a missing `OPENAI_API_KEY` when OpenAI is selected for any role.
pub fn settings_from<F>(lookup: F) -> Result<LlmSettings>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(LlmSettings {
        chat: config_chat(&lookup)?,
        embedding: config_embedding(&lookup)?,
        retry: retry_policy(&lookup)?,
    })
}

/// Constructs the chat (summarization) profile.
///
/// # Defaults
/// - OpenAI model `gpt-4`, Ollama model `llama2`
/// - `temperature = Some(0.2)`
pub fn config_chat<F>(lookup: &F) -> Result<LlmModelConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let provider: LlmProvider = var_or(lookup, "LLM_PROVIDER", "openai").parse()?;
    let timeout_secs = parse_var_or(lookup, "REQUEST_TIMEOUT", LlmModelConfig::DEFAULT_TIMEOUT_SECS)?;
    let max_tokens = match lookup("LLM_MAX_TOKENS") {
        Some(v) if !v.trim().is_empty() => Some(parse_var_or(lookup, "LLM_MAX_TOKENS", 0u32)?),
        _ => None,
    };

    let (endpoint, model, api_key) = match provider {
        LlmProvider::OpenAI => (
            endpoint(lookup, "OPENAI_URL", OPENAI_URL)?,
            var_or(lookup, "OPENAI_MODEL", "gpt-4"),
            Some(must_var(lookup, "OPENAI_API_KEY")?),
        ),
        LlmProvider::Ollama => (
            endpoint(lookup, "OLLAMA_URL", OLLAMA_URL)?,
            var_or(lookup, "OLLAMA_MODEL", "llama2"),
            None,
        ),
    };

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens,
        temperature: Some(0.2),
        timeout_secs: Some(timeout_secs),
    })
}

/// Constructs the embedding profile.
///
/// # Defaults
/// - OpenAI model `text-embedding-ada-002`, Ollama model `nomic-embed-text`
/// - `temperature = None` (not applicable)
pub fn config_embedding<F>(lookup: &F) -> Result<LlmModelConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let provider: LlmProvider = var_or(lookup, "EMBEDDING_PROVIDER", "openai").parse()?;
    let timeout_secs = parse_var_or(lookup, "REQUEST_TIMEOUT", LlmModelConfig::DEFAULT_TIMEOUT_SECS)?;

    let (endpoint, model, api_key) = match provider {
        LlmProvider::OpenAI => (
            endpoint(lookup, "OPENAI_URL", OPENAI_URL)?,
            var_or(lookup, "EMBEDDING_MODEL", "text-embedding-ada-002"),
            Some(must_var(lookup, "OPENAI_API_KEY")?),
        ),
        LlmProvider::Ollama => (
            endpoint(lookup, "OLLAMA_URL", OLLAMA_URL)?,
            var_or(lookup, "EMBEDDING_MODEL", "nomic-embed-text"),
            None,
        ),
    };

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: None,
        timeout_secs: Some(timeout_secs),
    })
}

/// Rate-limit retry policy shared by both profiles.
pub fn retry_policy<F>(lookup: &F) -> Result<RetryPolicy>
where
    F: Fn(&str) -> Option<String>,
{
    let max_retries = parse_var_or(lookup, "MAX_RETRIES", 1u32)?;
    let base_secs = parse_var_or(lookup, "RATE_LIMIT_DELAY", 1.0f64)?;
    let defaults = RetryPolicy::default();
    let base_delay = if base_secs.is_finite() && base_secs >= 0.0 {
        Duration::try_from_secs_f64(base_secs)
            .unwrap_or(defaults.max_delay)
            .min(defaults.max_delay)
    } else {
        defaults.base_delay
    };

    Ok(RetryPolicy {
        max_retries,
        base_delay,
        ..defaults
    })
}

fn endpoint<F>(lookup: &F, var: &'static str, default: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = var_or(lookup, var, default);
    validate_http_endpoint(var, &value)?;
    Ok(value.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::{AiLlmError, ConfigError};
    use std::collections::HashMap;

    fn env(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |k| map.get(k).map(|v| v.to_string())
    }

    #[test]
    fn openai_defaults() {
        let s = settings_from(env(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(s.chat.provider, LlmProvider::OpenAI);
        assert_eq!(s.chat.model, "gpt-4");
        assert_eq!(s.chat.endpoint, "https://api.openai.com");
        assert_eq!(s.embedding.model, "text-embedding-ada-002");
        assert_eq!(s.chat.timeout_secs, Some(60));
        assert_eq!(s.retry.max_retries, 1);
    }

    #[test]
    fn openai_requires_key() {
        let err = settings_from(env(&[])).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::MissingVar("OPENAI_API_KEY"))
        ));
    }

    #[test]
    fn ollama_needs_no_key() {
        let s = settings_from(env(&[
            ("LLM_PROVIDER", "ollama"),
            ("EMBEDDING_PROVIDER", "ollama"),
            ("OLLAMA_URL", "http://localhost:11434/"),
            ("REQUEST_TIMEOUT", "15"),
        ]))
        .unwrap();
        assert_eq!(s.chat.provider, LlmProvider::Ollama);
        assert_eq!(s.chat.model, "llama2");
        assert_eq!(s.chat.endpoint, "http://localhost:11434");
        assert_eq!(s.embedding.timeout_secs, Some(15));
        assert!(s.chat.api_key.is_none());
    }

    #[test]
    fn rate_limit_delay_is_bounded() {
        let p = retry_policy(&env(&[("RATE_LIMIT_DELAY", "1e30")])).unwrap();
        assert_eq!(p.base_delay, RetryPolicy::default().max_delay);

        let p = retry_policy(&env(&[("RATE_LIMIT_DELAY", "0.25")])).unwrap();
        assert_eq!(p.base_delay, Duration::from_millis(250));

        let p = retry_policy(&env(&[("RATE_LIMIT_DELAY", "-1")])).unwrap();
        assert_eq!(p.base_delay, RetryPolicy::default().base_delay);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = settings_from(env(&[("LLM_PROVIDER", "bard")])).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::UnsupportedProvider(_))
        ));
    }
}
