//! Rate-limit aware retry combinator.
//!
//! Wrap a single provider call with [`with_retry`]; only throttling
//! (`HTTP 429`) is retried, everything else returns immediately so the
//! caller can map it to its own failure category.

use std::{future::Future, time::Duration};

use tracing::warn;

use crate::error_handler::AiLlmError;

/// How often and how long to wait before re-issuing a throttled call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 disables retrying).
    pub max_retries: u32,
    /// Backoff used when the provider gives no `retry-after` hint; doubled per attempt.
    pub base_delay: Duration,
    /// Upper bound for any single wait, including provider hints.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let backoff = hint.unwrap_or_else(|| {
            self.base_delay
                .checked_mul(2u32.saturating_pow(attempt))
                .unwrap_or(self.max_delay)
        });
        backoff.min(self.max_delay)
    }
}

/// Runs `op`, re-running it while it fails with a rate-limit error and the
/// policy still allows retries.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, AiLlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AiLlmError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Err(err) if err.is_rate_limited() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt, err.retry_after());
                warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited by provider; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}
