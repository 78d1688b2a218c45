//! Selector → aggregator → ranker pipeline.

pub mod aggregator;
pub mod engine;
pub mod ranker;
pub mod selector;

pub use aggregator::{AggregatedRanking, aggregate};
pub use engine::{Aggregation, Leaderboard, aggregate_window, rank_aggregation, rank_items};
pub use ranker::{RankFilters, RankedPage, compare_rankings, rank};
pub use selector::{SelectedRating, select};
