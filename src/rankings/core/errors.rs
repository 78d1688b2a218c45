//! Error types for the rankings subsystem.

use thiserror::Error;

/// Rankings subsystem error type.
///
/// The pipeline stages themselves never fail on malformed events; the only
/// engine-side variants are query and configuration validation. Everything
/// else belongs to the fetch step that supplies the snapshot.
#[derive(Debug, Error)]
pub enum RankingError {
    /// Invalid query parameters (zero limit, zero minimum sample count).
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Categorical filter on a field that is not filterable.
    #[error("unknown filter field: {0}")]
    UnknownFilterField(String),
    /// Time window string that cannot be parsed.
    #[error("invalid time window: {0}")]
    InvalidTimeWindow(String),
    /// Scope string that cannot be parsed.
    #[error("invalid scope: {0}")]
    InvalidScope(String),
    /// Snapshot file I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Snapshot or config deserialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// `SQLite` source error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` source error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// Snapshot fetch did not complete within the configured number of seconds.
    #[error("snapshot fetch timed out after {0}s")]
    FetchTimeout(u64),
}

impl RankingError {
    /// Whether this error comes from the collaborator that supplies the snapshot.
    #[must_use]
    pub const fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Json(_) | Self::Sqlite(_) | Self::TokioSqlite(_) | Self::FetchTimeout(_)
        )
    }
}

/// Convenience result alias for rankings operations.
pub type RankingResult<T> = Result<T, RankingError>;
