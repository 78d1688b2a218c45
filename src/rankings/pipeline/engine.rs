//! End-to-end ranking run over an in-memory snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rankings::core::errors::RankingResult;
use crate::rankings::core::event::RatingEvent;
use crate::rankings::core::item::Item;
use crate::rankings::core::query::RankQuery;
use crate::rankings::pipeline::aggregator::{AggregatedRanking, aggregate};
use crate::rankings::pipeline::ranker::{RankFilters, rank};
use crate::rankings::pipeline::selector::select;

/// Aggregates for a query's scope, window and tag, before ranking filters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregation {
    /// One entry per rated, catalogued item.
    pub rankings: Vec<AggregatedRanking>,
    /// Events that survived selection.
    pub rated_events: usize,
}

/// Result of one ranking run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    /// Ranked entries, at most `limit`.
    pub results: Vec<AggregatedRanking>,
    /// Entries that matched the filters before truncation.
    pub total_before_limit: usize,
    /// Events that survived selection.
    pub rated_events: usize,
}

/// Run selection and aggregation for a query.
///
/// Search, categorical filters and minimum sample count are not applied here,
/// so the result can be re-ranked under different filters.
#[must_use]
pub fn aggregate_window(
    events: &[RatingEvent],
    catalog: &[Item],
    query: &RankQuery,
    now: DateTime<Utc>,
) -> Aggregation {
    let selected = select(events, &query.scope, query.window, query.tag_filter(), now);
    Aggregation {
        rated_events: selected.len(),
        rankings: aggregate(&selected, catalog),
    }
}

/// Rank an aggregation under a query's post-aggregation filters.
///
/// # Errors
/// Returns an error if the query is invalid.
pub fn rank_aggregation(aggregation: Aggregation, query: &RankQuery) -> RankingResult<Leaderboard> {
    query.validate()?;
    let page = rank(aggregation.rankings, &RankFilters::from_query(query), query.limit);
    Ok(Leaderboard {
        results: page.results,
        total_before_limit: page.total_before_limit,
        rated_events: aggregation.rated_events,
    })
}

/// Rank catalog items from a snapshot of rating events.
///
/// `now` anchors the time window, so identical inputs give identical output.
///
/// # Errors
/// Returns an error if the query is invalid. Malformed events, unknown items
/// and empty results are never errors.
pub fn rank_items(
    events: &[RatingEvent],
    catalog: &[Item],
    query: &RankQuery,
    now: DateTime<Utc>,
) -> RankingResult<Leaderboard> {
    let aggregation = aggregate_window(events, catalog, query, now);
    let leaderboard = rank_aggregation(aggregation, query)?;

    tracing::debug!(
        events = events.len(),
        catalog = catalog.len(),
        rated_events = leaderboard.rated_events,
        results = leaderboard.results.len(),
        "ranked items"
    );
    Ok(leaderboard)
}
