//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::rankings::core::config::{RankingsConfig, SourceConfig};
use crate::rankings::core::errors::RankingResult;
use crate::rankings::source::{JsonSnapshotSource, SnapshotSource, SqliteSnapshotSource};

/// Shared application state.
pub struct AppState {
    /// Where each request's snapshot comes from.
    pub source: Arc<dyn SnapshotSource>,
    /// Service configuration.
    pub config: RankingsConfig,
}

impl AppState {
    /// Create state around an existing source.
    #[must_use]
    pub fn new(source: Arc<dyn SnapshotSource>, config: RankingsConfig) -> Arc<Self> {
        Arc::new(Self { source, config })
    }

    /// Create state with the source named in the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the source cannot be opened.
    pub async fn from_config(config: RankingsConfig) -> RankingResult<Arc<Self>> {
        config.validate()?;
        let source: Arc<dyn SnapshotSource> = match &config.source {
            SourceConfig::Json { path } => {
                tracing::info!("Snapshot file: {}", path.display());
                Arc::new(JsonSnapshotSource::new(path.clone()))
            }
            SourceConfig::Sqlite { path } => {
                tracing::info!("Snapshot database: {}", path.display());
                Arc::new(SqliteSnapshotSource::open(path).await?)
            }
        };
        Ok(Self::new(source, config))
    }
}
