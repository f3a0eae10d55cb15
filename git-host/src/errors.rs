//! Crate-wide error hierarchy for git-host.

use reqwest::{StatusCode, header::HeaderMap};
use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type GitHostResult<T> = Result<T, GitHostError>;

/// Root error type for the git-host crate.
#[derive(Debug, Error)]
pub enum GitHostError {
    /// Missing token, bad base URL, malformed `owner/repo`.
    #[error("config error: {0}")]
    Config(String),

    /// Input validation errors (empty comment body, zero PR number).
    #[error("validation error: {0}")]
    Validation(String),

    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403) without rate-limit headers.
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404), usually an unknown PR number or repository.
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429, or 403 with an exhausted quota).
    #[error("rate limited")]
    RateLimited {
        /// Optional `Retry-After` hint in seconds when available.
        retry_after_secs: Option<u64>,
    },

    /// Gateway / server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other non-2xx status.
    #[error("http status error: status {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected/invalid shape of the GitHub response.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GitHostError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return GitHostError::Timeout;
        }
        if e.is_decode() {
            return GitHostError::InvalidResponse(e.to_string());
        }
        if let Some(status) = e.status() {
            return GitHostError::from_status(status, None);
        }
        GitHostError::Network(e.to_string())
    }
}

impl GitHostError {
    /// Maps a non-success status (plus headers when available) to an error.
    ///
    /// GitHub signals an exhausted primary quota with `403` and
    /// `x-ratelimit-remaining: 0`, secondary limits with `retry-after`.
    pub fn from_status(status: StatusCode, headers: Option<&HeaderMap>) -> Self {
        let retry_after_secs = headers
            .and_then(|h| h.get(reqwest::header::RETRY_AFTER))
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let quota_exhausted = headers
            .and_then(|h| h.get("x-ratelimit-remaining"))
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0");

        match status.as_u16() {
            401 => GitHostError::Unauthorized,
            403 if quota_exhausted || retry_after_secs.is_some() => {
                GitHostError::RateLimited { retry_after_secs }
            }
            403 => GitHostError::Forbidden,
            404 => GitHostError::NotFound,
            429 => GitHostError::RateLimited { retry_after_secs },
            code @ 500..=599 => GitHostError::Server(code),
            code => GitHostError::HttpStatus(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            GitHostError::from_status(StatusCode::UNAUTHORIZED, None),
            GitHostError::Unauthorized
        ));
        assert!(matches!(
            GitHostError::from_status(StatusCode::NOT_FOUND, None),
            GitHostError::NotFound
        ));
        assert!(matches!(
            GitHostError::from_status(StatusCode::BAD_GATEWAY, None),
            GitHostError::Server(502)
        ));
        assert!(matches!(
            GitHostError::from_status(StatusCode::UNPROCESSABLE_ENTITY, None),
            GitHostError::HttpStatus(422)
        ));
    }

    #[test]
    fn forbidden_with_exhausted_quota_is_rate_limit() {
        let mut h = HeaderMap::new();
        h.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        assert!(matches!(
            GitHostError::from_status(StatusCode::FORBIDDEN, Some(&h)),
            GitHostError::RateLimited { retry_after_secs: None }
        ));

        let mut h = HeaderMap::new();
        h.insert(reqwest::header::RETRY_AFTER, HeaderValue::from_static("30"));
        assert!(matches!(
            GitHostError::from_status(StatusCode::TOO_MANY_REQUESTS, Some(&h)),
            GitHostError::RateLimited { retry_after_secs: Some(30) }
        ));

        assert!(matches!(
            GitHostError::from_status(StatusCode::FORBIDDEN, Some(&HeaderMap::new())),
            GitHostError::Forbidden
        ));
    }
}
