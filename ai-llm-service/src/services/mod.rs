pub mod ollama_service;
pub mod open_ai_service;

use tracing::error;

use crate::error_handler::{
    AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    parse_retry_after,
};

/// Turns a non-2xx response into a [`ProviderError`]; passes 2xx through.
///
/// `429` becomes [`ProviderErrorKind::RateLimited`] with the `retry-after`
/// hint so [`crate::retry::with_retry`] can honour it.
pub(crate) async fn ensure_success(
    provider: Provider,
    resp: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, AiLlmError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = parse_retry_after(resp.headers());
        error!(?provider, %url, ?retry_after, "provider rate limit exceeded");
        return Err(ProviderError::new(provider, ProviderErrorKind::RateLimited { retry_after }).into());
    }

    let snippet = make_snippet(&resp.text().await.unwrap_or_default());
    error!(?provider, %status, %url, %snippet, "provider returned non-success status");
    Err(ProviderError::new(
        provider,
        ProviderErrorKind::HttpStatus(HttpError {
            status,
            url: url.to_string(),
            snippet,
        }),
    )
    .into())
}

/// Validates that `endpoint` is a usable http(s) base URL and strips the trailing slash.
pub(crate) fn normalize_endpoint(provider: Provider, endpoint: &str) -> Result<String, AiLlmError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        return Err(ProviderError::new(
            provider,
            ProviderErrorKind::InvalidEndpoint(endpoint.to_string()),
        )
        .into());
    }
    Ok(endpoint.trim_end_matches('/').to_string())
}
