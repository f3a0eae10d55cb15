use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use git_host::GitHubClient;
use pr_index::PrIndex;
use pr_pipeline::{
    Orchestrator, PipelineDeps,
    adapters::{LlmEmbedder, LlmSummarizer},
};
use tracing::{info, warn};

use crate::{core::config::AppConfig, error_handler::AppError};

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Builds every client once and wires them into the orchestrator.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, AppError> {
        let clients = Clients::connect(cfg).await?;

        let deps = PipelineDeps {
            embedder: clients.embedder(cfg),
            index: clients.index,
            summarizer: Arc::new(LlmSummarizer::new(clients.llm)),
            poster: clients.github,
        };

        info!(
            repo = %cfg.github.repo,
            chat = %cfg.llm.chat.provider,
            embedding = %cfg.llm.embedding.provider,
            backend = %cfg.index.backend,
            "pipeline wired"
        );
        Ok(Self::new(Orchestrator::new(deps, cfg.pipeline)))
    }
}

/// Concrete clients shared by the server and the batch commands.
pub struct Clients {
    pub llm: Arc<LlmServiceProfiles>,
    pub index: Arc<PrIndex>,
    pub github: Arc<GitHubClient>,
}

impl Clients {
    /// The index schema is checked eagerly; a dimension mismatch aborts,
    /// an unreachable server is retried lazily on first use.
    pub async fn connect(cfg: &AppConfig) -> Result<Self, AppError> {
        let llm = Arc::new(LlmServiceProfiles::from_settings(cfg.llm.clone())?);

        let index = Arc::new(PrIndex::new(&cfg.index)?);
        match index.ensure_ready().await {
            Ok(()) => info!(collection = %cfg.index.collection, "similarity index ready"),
            Err(e) if e.is_config() => return Err(e.into()),
            Err(e) => warn!(error = %e, "similarity index not reachable yet; will retry on first use"),
        }

        let github = Arc::new(GitHubClient::new(cfg.github.clone())?);
        Ok(Self { llm, index, github })
    }

    pub fn embedder(&self, cfg: &AppConfig) -> Arc<LlmEmbedder> {
        Arc::new(LlmEmbedder::new(self.llm.clone(), cfg.index.space.size))
    }
}
