use std::process::ExitCode;

use ai_llm_service::telemetry;
use api::{core::config::AppConfig, error_handler::AppError};
use clap::{Parser, Subcommand};
use git_host::PullState;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crate targets whose events are rendered.
const LOG_TARGETS: &[&str] = &[
    "pr_digest",
    "api",
    "pr_pipeline",
    "ai_llm_service",
    "pr_index",
    "git_host",
];

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Defaults to `serve`.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve,
    /// Index existing pull requests so new ones find similar history
    Backfill {
        /// open, closed or all
        #[arg(long, default_value = "all")]
        state: PullState,
        /// Stop after this many PRs, most recently updated first
        #[arg(long)]
        limit: Option<usize>,
        /// PRs embedded at once; overrides BACKFILL_CONCURRENCY
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Remove one pull request from the similarity index
    Delete {
        /// PR number
        id: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env is fine; variables may come from the real environment.
    dotenvy::dotenv().ok();

    // Our crates log at LOG_LEVEL (default info).
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|v| v.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", LOG_TARGETS, level))
        .with(telemetry::layer(LOG_TARGETS))
        .init();

    match run(cli.command.unwrap_or(Commands::Serve)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "pr-digest exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), AppError> {
    match command {
        Commands::Serve => api::start().await,
        Commands::Backfill {
            state,
            limit,
            concurrency,
        } => {
            let config = AppConfig::from_env()?;
            let report = api::batch::backfill(&config, state, limit, concurrency).await?;
            for skipped in &report.skipped {
                warn!(pr_id = skipped.id, reason = %skipped.reason, "not indexed");
            }
            info!(
                listed = report.listed,
                stored = report.stored,
                skipped = report.skipped.len(),
                "backfill complete"
            );
            Ok(())
        }
        Commands::Delete { id } => {
            let config = AppConfig::from_env()?;
            api::batch::delete(&config, id).await
        }
    }
}
