//! Leaderboard rows and summary for renderers.

use serde::{Deserialize, Serialize};

use crate::rankings::core::fields::FilterField;
use crate::rankings::core::ids::ItemId;
use crate::rankings::core::query::RankQuery;
use crate::rankings::pipeline::aggregator::AggregatedRanking;
use crate::rankings::pipeline::engine::Leaderboard;

/// Shown when a row has no descriptive metadata.
pub const EMPTY_META: &str = "—";

/// Separator between metadata bits.
const META_SEPARATOR: &str = " · ";

/// Format a mean rating for display (two decimals).
#[must_use]
pub fn format_rating(value: f64) -> String {
    format!("{value:.2}")
}

/// One rendered leaderboard line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// 1-based position.
    pub position: usize,
    /// Item to open on selection.
    pub item_id: ItemId,
    /// Item label.
    pub label: String,
    /// Mean rating with two decimals.
    pub mean_display: String,
    /// Number of rated pours.
    pub sample_count: usize,
    /// Category, style and proof, joined.
    pub meta: String,
}

impl LeaderboardRow {
    /// Render an aggregate at a position.
    #[must_use]
    pub fn new(position: usize, ranking: &AggregatedRanking) -> Self {
        Self {
            position,
            item_id: ranking.item_id.clone(),
            label: ranking.label.clone(),
            mean_display: format_rating(ranking.mean_rating),
            sample_count: ranking.sample_count,
            meta: meta_line(ranking),
        }
    }

    /// Single-line caption, e.g. `1. Weller - 12 Year  |  avg 8.50  |  4 pours  |  Core`.
    #[must_use]
    pub fn caption(&self) -> String {
        format!(
            "{}. {}  |  avg {}  |  {} pours  |  {}",
            self.position, self.label, self.mean_display, self.sample_count, self.meta
        )
    }
}

/// Rows for every result, in leaderboard order.
#[must_use]
pub fn leaderboard_rows(board: &Leaderboard) -> Vec<LeaderboardRow> {
    board
        .results
        .iter()
        .enumerate()
        .map(|(idx, ranking)| LeaderboardRow::new(idx + 1, ranking))
        .collect()
}

fn meta_line(ranking: &AggregatedRanking) -> String {
    let mut bits: Vec<String> = Vec::new();
    if let Some(category) = ranking.field(FilterField::Category) {
        bits.push(category.to_string());
    }
    if let Some(style) = ranking.field(FilterField::MashbillStyle) {
        bits.push(style.to_string());
    }
    if let Some(proof) = ranking.field(FilterField::Proof) {
        bits.push(format!("Proof {proof}"));
    }

    if bits.is_empty() {
        EMPTY_META.to_string()
    } else {
        bits.join(META_SEPARATOR)
    }
}

/// Headline numbers for a leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardSummary {
    /// Items shown after filters and truncation.
    pub rated_items: usize,
    /// Items matching filters before truncation.
    pub matching_items: usize,
    /// Rated events in scope and window.
    pub rated_events: usize,
    /// Scope label.
    pub scope: String,
    /// Time window label.
    pub window: String,
    /// Active tag filter, if any.
    pub tag: Option<String>,
}

impl LeaderboardSummary {
    /// Summarize a leaderboard produced for a query.
    #[must_use]
    pub fn new(board: &Leaderboard, query: &RankQuery) -> Self {
        Self {
            rated_items: board.results.len(),
            matching_items: board.total_before_limit,
            rated_events: board.rated_events,
            scope: query.scope.label(),
            window: query.window.to_string(),
            tag: query.tag_filter().map(str::to_string),
        }
    }
}
