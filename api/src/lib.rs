//! HTTP surface: the GitHub webhook plus liveness routes, and the
//! one-shot [`batch`] commands sharing the same wiring.

pub mod batch;
pub mod core;
pub mod error_handler;
mod routes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

use crate::{
    core::{app_state::AppState, config::AppConfig},
    error_handler::AppError,
    routes::{
        system_route::{health, root},
        webhook::webhook_route::webhook_route,
    },
};

/// Router with every route attached to `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/webhook", post(webhook_route))
        .with_state(state)
}

/// Reads the environment, wires the pipeline and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let state = Arc::new(AppState::from_config(&config).await?);
    let app = build_router(state.clone());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(AppError::Bind)?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    let stats = state.orchestrator.stats();
    info!(?stats, "server stopped");
    Ok(())
}

/// Resolves on Ctrl+C. If the handler cannot be installed the server keeps
/// running until killed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
