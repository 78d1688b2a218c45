//! HTTP server for the Viscosity rankings API.
//!
//! Provides REST endpoints for:
//! - Leaderboards (`POST /api/rankings`)
//! - Popular tags (`GET /api/tags/popular`)
//! - Health checks

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Server error type returned by the run helpers.
pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Router with CORS and request tracing applied.
///
/// The API is read-only, so any origin may call it.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server.
///
/// # Errors
/// Returns an error if the server fails to start.
pub async fn run_server(state: Arc<AppState>, port: u16) -> Result<(), ServerError> {
    run_server_with_shutdown(state, port, std::future::pending()).await
}

/// Start the HTTP server and stop accepting connections once `shutdown_signal` completes.
///
/// Port `0` binds an ephemeral port.
///
/// # Errors
/// Returns an error if the listener cannot bind or the server fails.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    port: u16,
    shutdown_signal: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let max_limit = state.config.server.max_limit;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        max_limit,
        "Viscosity rankings listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}
