//! Presentation helpers for leaderboard renderers.

pub mod facets;
pub mod leaderboard;

pub use facets::{facet_values, facets};
pub use leaderboard::{EMPTY_META, LeaderboardRow, LeaderboardSummary, format_rating, leaderboard_rows};
