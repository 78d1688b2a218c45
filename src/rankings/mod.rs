//! Rankings subsystem for the Viscosity leaderboard.
//!
//! Turns a snapshot of rating events and catalog entries into a ranked
//! leaderboard:
//! - `core`: Configuration, errors, IDs, events, items, queries, and tags
//! - `pipeline`: Selector, aggregator, and ranker stages plus the engine entry point
//! - `display`: Row formatting, summaries, and filter facets for renderers
//! - `source`: Snapshot collaborators (in-memory, JSON file, `SQLite`)

pub mod core;
pub mod display;
pub mod pipeline;
pub mod source;

use tracing_subscriber::EnvFilter;

// Re-export commonly used types for convenience
pub use self::core::{
    AuthorId, CategoricalFilters, FilterField, Item, ItemId, QueryDefaults, RankQuery,
    RankingError, RankingResult, RankingsConfig, RatingEvent, RawRating, Scope, ServerConfig,
    SourceConfig, TimeWindow, normalize_tag, popular_tags,
};
pub use display::{LeaderboardRow, LeaderboardSummary, facets, format_rating, leaderboard_rows};
pub use pipeline::{
    AggregatedRanking, Aggregation, Leaderboard, aggregate_window, rank_aggregation, rank_items,
};
pub use source::{
    JsonSnapshotSource, Snapshot, SnapshotSource, SqliteSnapshotSource, fetch_and_rank,
    fetch_snapshot,
};

/// Initialize tracing with an env-driven subscriber, `info` by default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
