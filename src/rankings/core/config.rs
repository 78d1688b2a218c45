//! Configuration for the rankings service.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::rankings::core::errors::{RankingError, RankingResult};
use crate::rankings::core::query::{
    DEFAULT_LIMIT, DEFAULT_MIN_SAMPLE_COUNT, RankQuery, TimeWindow,
};

/// Top-level configuration for the rankings service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingsConfig {
    /// Query defaults applied when a caller omits a field.
    #[serde(default)]
    pub defaults: QueryDefaults,
    /// Where snapshots are fetched from.
    #[serde(default)]
    pub source: SourceConfig,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

impl RankingsConfig {
    /// Load configuration from a JSON file and validate it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> RankingResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `VISCOSITY_*` environment variables.
    ///
    /// Unparseable numeric overrides are ignored.
    ///
    /// # Errors
    /// Returns an error if the resulting configuration is invalid.
    pub fn from_env() -> RankingResult<Self> {
        let config = Self::default().with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (environment or test fixture).
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("VISCOSITY_SQLITE") {
            self.source = SourceConfig::Sqlite { path: PathBuf::from(path) };
        } else if let Some(path) = lookup("VISCOSITY_SNAPSHOT") {
            self.source = SourceConfig::Json { path: PathBuf::from(path) };
        }

        if let Some(port) = lookup("VISCOSITY_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        if let Some(secs) = lookup("VISCOSITY_FETCH_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.server.fetch_timeout_secs = secs;
        }

        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range.
    pub fn validate(&self) -> RankingResult<()> {
        if self.defaults.limit == 0 {
            return Err(RankingError::InvalidConfig(
                "defaults.limit must be > 0".to_string(),
            ));
        }

        if self.defaults.min_sample_count == 0 {
            return Err(RankingError::InvalidConfig(
                "defaults.min_sample_count must be >= 1".to_string(),
            ));
        }

        if self.server.max_limit == 0 {
            return Err(RankingError::InvalidConfig(
                "server.max_limit must be > 0".to_string(),
            ));
        }

        if self.server.fetch_timeout_secs == 0 {
            return Err(RankingError::InvalidConfig(
                "server.fetch_timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Defaults for omitted query fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// Number of entries shown.
    pub limit: usize,
    /// Minimum qualifying ratings per item.
    pub min_sample_count: usize,
    /// Time window.
    pub window: TimeWindow,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            min_sample_count: DEFAULT_MIN_SAMPLE_COUNT,
            window: TimeWindow::AllTime,
        }
    }
}

impl QueryDefaults {
    /// A blank query carrying these defaults.
    #[must_use]
    pub fn query(&self) -> RankQuery {
        RankQuery::new()
            .with_limit(self.limit)
            .with_min_sample_count(self.min_sample_count)
            .with_window(self.window)
    }
}

/// Snapshot source selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// JSON snapshot file with `events` and `items` arrays.
    Json {
        /// Path to the snapshot file.
        path: PathBuf,
    },
    /// `SQLite` database with `events` and `items` tables.
    Sqlite {
        /// Path to the database file.
        path: PathBuf,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Json {
            path: PathBuf::from("snapshot.json"),
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
    /// Timeout for fetching a snapshot, in seconds.
    pub fetch_timeout_secs: u64,
    /// Largest limit accepted from HTTP callers.
    pub max_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            fetch_timeout_secs: 10,
            max_limit: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = RankingsConfig::default();
        assert_eq!(config.defaults.limit, 50);
        assert_eq!(config.defaults.min_sample_count, 1);
        assert_eq!(config.server.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("VISCOSITY_SQLITE", "/tmp/pours.db"),
            ("VISCOSITY_SNAPSHOT", "/tmp/ignored.json"),
            ("VISCOSITY_PORT", "8088"),
            ("VISCOSITY_FETCH_TIMEOUT_SECS", "not-a-number"),
        ]);
        let config =
            RankingsConfig::default().with_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(
            config.source,
            SourceConfig::Sqlite { path: PathBuf::from("/tmp/pours.db") }
        );
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.fetch_timeout_secs, 10);
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        let mut config = RankingsConfig::default();
        config.server.max_limit = 0;
        assert!(config.validate().is_err());

        let mut config = RankingsConfig::default();
        config.defaults.min_sample_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_json_shape() {
        let config: RankingsConfig = serde_json::from_str(
            r#"{"source": {"kind": "sqlite", "path": "pours.db"}, "defaults": {"limit": 25, "min_sample_count": 3, "window": {"days": 7}}}"#,
        )
        .unwrap();

        assert_eq!(config.defaults.query().limit, 25);
        assert_eq!(config.defaults.query().window, TimeWindow::LastDays(7));
        assert_eq!(config.server, ServerConfig::default());
    }
}
