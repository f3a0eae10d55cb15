//! LLM access for the PR digest service: chat completions for summaries and
//! embeddings for similarity search, over OpenAI or a local Ollama.

pub mod config;
pub mod error_handler;
pub mod retry;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::default_config::{LlmSettings, settings_from};
pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, ConfigError, ProviderError, ProviderErrorKind};
pub use retry::{RetryPolicy, with_retry};
pub use service_profiles::LlmServiceProfiles;
