//! One-shot commands run from the binary instead of the server.

use git_host::PullState;
use pr_pipeline::{BackfillReport, Backfiller};
use tracing::{info, warn};

use crate::{
    core::{app_state::Clients, config::AppConfig},
    error_handler::AppError,
};

/// Embeds and indexes existing PRs so new ones have history to match.
///
/// `concurrency` overrides `BACKFILL_CONCURRENCY`.
pub async fn backfill(
    cfg: &AppConfig,
    state: PullState,
    limit: Option<usize>,
    concurrency: Option<usize>,
) -> Result<BackfillReport, AppError> {
    let clients = Clients::connect(cfg).await?;
    let backfiller = Backfiller::new(clients.embedder(cfg), clients.index, clients.github)
        .with_concurrency(concurrency.unwrap_or(cfg.backfill_concurrency));

    let report = backfiller.run(state, limit).await?;
    if !report.skipped.is_empty() {
        warn!(skipped = report.skipped.len(), "some PRs were not indexed");
    }
    Ok(report)
}

/// Drops PR `id` from the similarity index.
pub async fn delete(cfg: &AppConfig, id: u64) -> Result<(), AppError> {
    let clients = Clients::connect(cfg).await?;
    clients
        .index
        .delete(id)
        .await
        .map_err(|source| AppError::Delete { id, source })?;
    info!(id, collection = %cfg.index.collection, "PR removed from index");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pr_pipeline::SourceError;
    use std::collections::HashMap;

    fn config(pairs: &[(&'static str, &'static str)]) -> AppConfig {
        let mut map: HashMap<&str, &str> = HashMap::from([
            ("GITHUB_TOKEN", "ghp_test"),
            ("REPO_NAME", "octo/widgets"),
            ("OPENAI_API_KEY", "sk-test"),
            ("INDEX_BACKEND", "memory"),
            ("EMBEDDING_DIM", "3"),
        ]);
        map.extend(pairs.iter().copied());
        AppConfig::from_lookup(|k| map.get(k).map(|v| v.to_string())).unwrap()
    }

    #[tokio::test]
    async fn delete_from_memory_index_succeeds() {
        delete(&config(&[]), 42).await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_host_aborts_backfill() {
        let cfg = config(&[("GITHUB_API_BASE", "http://127.0.0.1:9"), ("REQUEST_TIMEOUT", "5")]);

        let err = backfill(&cfg, PullState::All, Some(5), Some(2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Backfill(SourceError::Host(_))));
        assert!(err.to_string().starts_with("failed to list pull requests"));
    }

    #[tokio::test]
    async fn zero_limit_backfill_lists_nothing() {
        let cfg = config(&[("GITHUB_API_BASE", "http://127.0.0.1:9")]);

        let report = backfill(&cfg, PullState::Open, Some(0), None).await.unwrap();
        assert_eq!(report, BackfillReport::default());
    }
}
