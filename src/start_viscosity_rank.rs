//! Startup helpers for the Viscosity rankings server.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use crate::rankings::core::config::RankingsConfig;
use crate::rankings::core::errors::RankingResult;
use crate::rankings::init_tracing;
use crate::server::{self, AppState};

/// Run the server (used by the `viscosity-rank-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    tracing::info!("Starting Viscosity rankings v{}", env!("CARGO_PKG_VERSION"));

    let config = match RankingsConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };
    let port = config.server.port;

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let state = match rt.block_on(initialize(config)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(run_server_with_shutdown(state, port, shutdown_signal())) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

/// Initialize application state without starting the server.
///
/// # Errors
/// Returns an error if the configured source cannot be opened.
pub async fn initialize(config: RankingsConfig) -> RankingResult<Arc<AppState>> {
    AppState::from_config(config).await
}

/// Run server with graceful shutdown.
///
/// # Errors
/// Returns an error if the server fails.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    port: u16,
    shutdown_signal: F,
) -> Result<(), server::ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    server::run_server_with_shutdown(state, port, shutdown_signal).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rankings::core::config::SourceConfig;

    #[tokio::test]
    async fn test_initialize_opens_sqlite_source() {
        let path = std::env::temp_dir().join(format!("viscosity-start-{}.db", std::process::id()));
        let config = RankingsConfig {
            source: SourceConfig::Sqlite { path: path.clone() },
            ..RankingsConfig::default()
        };

        let state = initialize(config).await.unwrap();
        assert_eq!(state.config.server.port, 3000);
        drop(state);
        let _ = std::fs::remove_file(&path);
    }
}
