use crate::config::llm_provider::LlmProvider;

/// Configuration for one LLM model invocation profile.
///
/// # Fields
///
/// - `provider`: which backend to use.
/// - `model`: the model identifier (e.g., `"gpt-4"`, `"text-embedding-ada-002"`).
/// - `endpoint`: API base URL, without the `/v1/...` suffix.
/// - `api_key`: API key for providers that require authentication.
/// - `max_tokens`: maximum number of tokens to generate (if supported).
/// - `temperature`: sampling temperature.
/// - `timeout_secs`: request timeout in seconds (60 when unset).
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Default request timeout applied when `timeout_secs` is unset.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Effective request timeout.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.unwrap_or(Self::DEFAULT_TIMEOUT_SECS))
    }
}
