//! Process configuration, read once at startup.
//!
//! Everything is resolved through a `lookup` closure; the binary passes
//! `|k| std::env::var(k).ok()`, tests pass a map.

use std::{str::FromStr, time::Duration};

use ai_llm_service::{AiLlmError, LlmSettings, settings_from};
use git_host::{GitHostError, GitHubConfig, split_owner_repo};
use pr_index::{IndexBackend, IndexConfig, VectorSpace, VectorStoreError};
use pr_pipeline::PipelineConfig;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value in {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error(transparent)]
    Index(#[from] VectorStoreError),

    #[error("invalid GitHub settings: {0}")]
    GitHub(#[from] GitHostError),
}

/// Fully resolved settings for every component.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub github: GitHubConfig,
    pub llm: LlmSettings,
    pub index: IndexConfig,
    pub pipeline: PipelineConfig,
    /// PRs embedded at once during a history backfill.
    pub backfill_concurrency: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT", 60u64)?);

        let repo = required(&lookup, "REPO_NAME")?;
        split_owner_repo(&repo).map_err(|e| ConfigError::InvalidValue {
            var: "REPO_NAME",
            reason: e.to_string(),
        })?;
        let github = GitHubConfig {
            base_api: endpoint(&lookup, "GITHUB_API_BASE", "https://api.github.com")?,
            token: required(&lookup, "GITHUB_TOKEN")?,
            repo,
            timeout,
        };

        let llm = settings_from(&lookup)?;

        let dim = parse_or(&lookup, "EMBEDDING_DIM", 1536usize)?;
        let backend: IndexBackend = or_default(&lookup, "INDEX_BACKEND", "qdrant").parse()?;
        let index = IndexConfig {
            backend,
            qdrant_url: endpoint(&lookup, "QDRANT_URL", "http://localhost:6334")?,
            qdrant_api_key: lookup("QDRANT_API_KEY").filter(|v| !v.trim().is_empty()),
            collection: or_default(&lookup, "COLLECTION_NAME", "pr_cache"),
            space: VectorSpace::cosine(dim),
            timeout,
        };
        index.validate()?;

        let similar_limit = parse_or(&lookup, "SIMILAR_PR_LIMIT", 3usize)?;
        if similar_limit == 0 {
            return Err(ConfigError::InvalidValue {
                var: "SIMILAR_PR_LIMIT",
                reason: "must be > 0".into(),
            });
        }
        let pipeline = PipelineConfig {
            similar_limit,
            post_failed_summaries: flag_or(&lookup, "POST_FAILED_SUMMARIES", true)?,
            return_embedding: flag_or(&lookup, "RETURN_EMBEDDING", false)?,
        };

        let backfill_concurrency = parse_or(&lookup, "BACKFILL_CONCURRENCY", 4usize)?;
        if backfill_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                var: "BACKFILL_CONCURRENCY",
                reason: "must be > 0".into(),
            });
        }

        Ok(Self {
            server_host: or_default(&lookup, "SERVER_HOST", "127.0.0.1"),
            server_port: parse_or(&lookup, "SERVER_PORT", 8000u16)?,
            github,
            llm,
            index,
            pipeline,
            backfill_concurrency,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn or_default<F>(lookup: &F, var: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(var))
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var).map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
        }),
        _ => Ok(default),
    }
}

fn flag_or<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                var,
                reason: format!("expected a boolean, got '{v}'"),
            }),
        },
    }
}

/// Requires an http(s) scheme; plain http to a remote host is only warned about.
fn endpoint<F>(lookup: &F, var: &'static str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = or_default(lookup, var, default);
    if let Some(rest) = value.strip_prefix("http://") {
        if !(rest.starts_with("localhost") || rest.starts_with("127.0.0.1")) {
            warn!(var, endpoint = %value, "using insecure HTTP endpoint");
        }
    } else if !value.starts_with("https://") {
        return Err(ConfigError::InvalidValue {
            var,
            reason: "must start with http:// or https://".into(),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let mut map: HashMap<&str, &str> = HashMap::from([
            ("GITHUB_TOKEN", "ghp_test"),
            ("REPO_NAME", "octo/widgets"),
            ("OPENAI_API_KEY", "sk-test"),
        ]);
        map.extend(pairs.iter().copied());
        move |k| map.get(k).map(|v| v.to_string())
    }

    #[test]
    fn defaults() {
        let cfg = AppConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8000");
        assert_eq!(cfg.github.base_api, "https://api.github.com");
        assert_eq!(cfg.github.timeout, Duration::from_secs(60));
        assert_eq!(cfg.index.collection, "pr_cache");
        assert_eq!(cfg.index.space.size, 1536);
        assert_eq!(cfg.index.backend, IndexBackend::Qdrant);
        assert_eq!(cfg.pipeline, PipelineConfig::default());
        assert_eq!(cfg.llm.chat.model, "gpt-4");
        assert_eq!(cfg.backfill_concurrency, 4);
    }

    #[test]
    fn overrides() {
        let cfg = AppConfig::from_lookup(env(&[
            ("INDEX_BACKEND", "memory"),
            ("EMBEDDING_DIM", "768"),
            ("SIMILAR_PR_LIMIT", "5"),
            ("POST_FAILED_SUMMARIES", "false"),
            ("RETURN_EMBEDDING", "1"),
            ("SERVER_PORT", "9090"),
            ("REQUEST_TIMEOUT", "15"),
            ("BACKFILL_CONCURRENCY", "8"),
        ]))
        .unwrap();
        assert_eq!(cfg.index.backend, IndexBackend::Memory);
        assert_eq!(cfg.index.space.size, 768);
        assert_eq!(cfg.pipeline.similar_limit, 5);
        assert!(!cfg.pipeline.post_failed_summaries);
        assert!(cfg.pipeline.return_embedding);
        assert_eq!(cfg.server_port, 9090);
        assert_eq!(cfg.index.timeout, Duration::from_secs(15));
        assert_eq!(cfg.backfill_concurrency, 8);
    }

    #[test]
    fn missing_token_is_reported() {
        let lookup = |k: &str| match k {
            "REPO_NAME" => Some("octo/widgets".to_string()),
            "OPENAI_API_KEY" => Some("sk".to_string()),
            _ => None,
        };
        assert!(matches!(
            AppConfig::from_lookup(lookup),
            Err(ConfigError::MissingVar("GITHUB_TOKEN"))
        ));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(AppConfig::from_lookup(env(&[("SERVER_PORT", "eighty")])).is_err());
        assert!(AppConfig::from_lookup(env(&[("RETURN_EMBEDDING", "maybe")])).is_err());
        assert!(AppConfig::from_lookup(env(&[("QDRANT_URL", "localhost:6334")])).is_err());
        assert!(AppConfig::from_lookup(env(&[("SIMILAR_PR_LIMIT", "0")])).is_err());
        assert!(AppConfig::from_lookup(env(&[("INDEX_BACKEND", "redis")])).is_err());
        assert!(AppConfig::from_lookup(env(&[("BACKFILL_CONCURRENCY", "0")])).is_err());
    }

    #[test]
    fn malformed_repo_names_the_variable() {
        let err = AppConfig::from_lookup(env(&[("REPO_NAME", "widgets")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "REPO_NAME", .. }));
        assert!(err.to_string().contains("REPO_NAME"));
    }
}
