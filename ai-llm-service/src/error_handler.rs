//! Unified error handling for `ai-llm-service`.
//!
//! This module exposes a single top-level error type [`AiLlmError`] for the whole
//! library, and groups domain-specific errors in nested types ([`ConfigError`],
//! [`ProviderError`]). Small helpers for reading/validating environment variables
//! are provided and return the unified [`Result<T>`] alias.
//!
//! All messages include the prefix `[AI LLM Service]` to simplify attribution in logs.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider responded, but not the way we wanted.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error (DNS, connect, reset).
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[AI LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl AiLlmError {
    /// Wraps a transport error, promoting client timeouts to [`AiLlmError::Timeout`].
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            AiLlmError::Timeout(timeout)
        } else {
            AiLlmError::HttpTransport(err)
        }
    }

    /// Returns `true` for provider throttling (HTTP 429).
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::RateLimited { .. },
                ..
            })
        )
    }

    /// Provider-supplied `retry-after` hint, if the error carries one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::RateLimited { retry_after },
                ..
            }) => *retry_after,
            _ => None,
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `REQUEST_TIMEOUT`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u64`).
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_PROVIDER` / `EMBEDDING_PROVIDER`.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `OLLAMA_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// Model name was empty.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Backend that produced a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Ollama,
}

/// Non-success HTTP exchange with a provider.
#[derive(Debug, Clone)]
pub struct HttpError {
    /// HTTP status code.
    pub status: StatusCode,
    /// Request URL.
    pub url: String,
    /// Short snippet of the response body (trimmed).
    pub snippet: String,
}

/// What went wrong while talking to a provider.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum ProviderErrorKind {
    /// Config routed to the wrong client.
    InvalidProvider,
    /// Endpoint is empty or lacks an http/https scheme.
    InvalidEndpoint(String),
    /// Provider requires an API key and none was configured.
    MissingApiKey,
    /// HTTP 429; `retry_after` carries the provider hint when present.
    RateLimited { retry_after: Option<Duration> },
    /// Any other non-2xx status.
    HttpStatus(HttpError),
    /// Response body did not have the expected shape.
    Decode(String),
    /// Completion decoded fine but carried no text.
    EmptyCompletion,
}

/// Error raised by a concrete provider client.
#[derive(Debug, Error)]
#[error("[AI LLM Service] {provider:?}: {}", describe(.kind))]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

fn describe(kind: &ProviderErrorKind) -> String {
    match kind {
        ProviderErrorKind::InvalidProvider => "config routed to the wrong provider".into(),
        ProviderErrorKind::InvalidEndpoint(e) => format!("invalid endpoint: {e}"),
        ProviderErrorKind::MissingApiKey => "missing API key".into(),
        ProviderErrorKind::RateLimited { retry_after } => match retry_after {
            Some(d) => format!("rate limited (retry after {}s)", d.as_secs()),
            None => "rate limited".into(),
        },
        ProviderErrorKind::HttpStatus(h) => {
            format!("HTTP {} from {}: {}", h.status, h.url, h.snippet)
        }
        ProviderErrorKind::Decode(msg) => format!("decode error: {msg}"),
        ProviderErrorKind::EmptyCompletion => "empty completion".into(),
    }
}

/// Trims a response body to a short single-line snippet for logs and errors.
pub fn make_snippet(body: &str) -> String {
    const MAX: usize = 240;
    let flat: String = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX {
        flat
    } else {
        let mut s: String = flat.chars().take(MAX).collect();
        s.push('…');
        s
    }
}

/// Parses a `retry-after` header given in seconds (the only form OpenAI sends).
///
/// Values too large for a [`Duration`] saturate to [`Duration::MAX`]; the
/// retry policy caps them at its `max_delay`.
pub fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty variable through `lookup`.
///
/// # Errors
/// Returns [`ConfigError::MissingVar`] if the variable is absent or empty.
pub fn must_var<F>(lookup: &F, name: &'static str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Reads an optional variable, falling back to `default` when unset or empty.
pub fn var_or<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parses an optional number, falling back to `default` when unset or empty.
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but unparsable.
pub fn parse_var_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => v.trim().parse::<T>().map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "not a valid number",
            })
        }),
        _ => Ok(default),
    }
}

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// Plain-HTTP endpoints outside localhost are accepted but reported.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the scheme is missing.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("https://") {
        return Ok(());
    }
    if value.starts_with("http://") {
        let host_part = &value["http://".len()..];
        if !(host_part.starts_with("localhost") || host_part.starts_with("127.0.0.1")) {
            tracing::warn!(
                var,
                endpoint = %value,
                "using insecure HTTP endpoint; consider HTTPS in production"
            );
        }
        return Ok(());
    }
    Err(ConfigError::InvalidFormat {
        var,
        reason: "must start with http:// or https://",
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(map: &'a HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |k| map.get(k).map(|v| v.to_string())
    }

    #[test]
    fn must_var_rejects_blank() {
        let env = HashMap::from([("TOKEN", "   ")]);
        let err = must_var(&lookup(&env), "TOKEN").unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::MissingVar("TOKEN"))
        ));
    }

    #[test]
    fn parse_var_or_uses_default_and_reports_garbage() {
        let env = HashMap::from([("BAD", "sixty")]);
        let f = lookup(&env);
        assert_eq!(parse_var_or(&f, "MISSING", 60u64).unwrap(), 60);
        assert!(parse_var_or::<_, u64>(&f, "BAD", 60).is_err());
    }

    #[test]
    fn endpoint_scheme_is_required() {
        assert!(validate_http_endpoint("X", "https://api.openai.com").is_ok());
        assert!(validate_http_endpoint("X", "http://localhost:11434").is_ok());
        assert!(validate_http_endpoint("X", "localhost:11434").is_err());
    }

    #[test]
    fn rate_limit_exposes_hint() {
        let err: AiLlmError = ProviderError::new(
            Provider::OpenAI,
            ProviderErrorKind::RateLimited {
                retry_after: Some(Duration::from_secs(2)),
            },
        )
        .into();
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
        assert!(err.to_string().contains("rate limited"));
    }

    fn retry_after(value: &'static str) -> Option<Duration> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::RETRY_AFTER,
            reqwest::header::HeaderValue::from_static(value),
        );
        parse_retry_after(&headers)
    }

    #[test]
    fn retry_after_accepts_seconds_and_ignores_garbage() {
        assert_eq!(retry_after("2"), Some(Duration::from_secs(2)));
        assert_eq!(retry_after("0.5"), Some(Duration::from_millis(500)));
        assert_eq!(retry_after("-3"), None);
        assert_eq!(retry_after("NaN"), None);
        assert_eq!(retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn huge_retry_after_saturates() {
        assert_eq!(retry_after("1e30"), Some(Duration::MAX));
        assert_eq!(retry_after("1e300"), Some(Duration::MAX));
    }

    #[test]
    fn snippet_is_flattened_and_bounded() {
        let long = "x ".repeat(500);
        let s = make_snippet(&long);
        assert!(s.chars().count() <= 241);
        assert!(!s.contains('\n'));
    }
}
