//! HTTP surface: health check, slash command and Events API endpoints.

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::info;

use crate::dispatch::DispatchConfig;
use crate::github::PullRequestGateway;
use crate::slack::SlackGateway;
use crate::team::TeamRegistry;
use crate::telemetry::TelemetrySink;

/// Path of the liveness endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Shared collaborators handed to every request.
#[derive(Clone)]
pub struct AppState {
    /// Team lookup.
    pub registry: Arc<dyn TeamRegistry>,
    /// GitHub pull request listing.
    pub github: Arc<dyn PullRequestGateway>,
    /// Slack Web API access.
    pub slack: Arc<dyn SlackGateway>,
    /// Telemetry sink for digest events.
    pub telemetry: Arc<dyn TelemetrySink>,
    /// Event dispatch rules.
    pub dispatch: Arc<DispatchConfig>,
}

/// Where the command and events endpoints are mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePaths {
    /// Slash command endpoint.
    pub command: String,
    /// Events API endpoint.
    pub events: String,
}

/// Errors raised while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The listener could not bind.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Requested socket address.
        address: SocketAddr,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The server stopped with an I/O failure.
    #[error("server failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the application router.
#[must_use]
pub fn router(state: AppState, paths: &RoutePaths) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(routes::health))
        .route(&paths.command, post(routes::pull_request_digest))
        .route(&paths.events, post(routes::slack_events))
        .with_state(state)
}

/// Binds `address` and serves until Ctrl+C.
///
/// # Errors
///
/// Returns [`ServeError`] when binding fails or the server stops with an
/// I/O error.
pub async fn serve(
    state: AppState,
    paths: &RoutePaths,
    address: SocketAddr,
) -> Result<(), ServeError> {
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| ServeError::Bind { address, source })?;
    let local_address = listener.local_addr()?;
    info!(
        address = %local_address,
        command = %paths.command,
        events = %paths.events,
        "listening"
    );

    axum::serve(listener, router(state, paths))
        .with_graceful_shutdown(async {
            let _ignored = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;
    Ok(())
}
