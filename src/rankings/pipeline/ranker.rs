//! Post-aggregation filtering, ordering, and truncation.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::rankings::core::fields::{CategoricalFilters, is_unconstrained};
use crate::rankings::core::query::{DEFAULT_MIN_SAMPLE_COUNT, RankQuery};
use crate::rankings::pipeline::aggregator::AggregatedRanking;

/// Filters applied after aggregation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankFilters {
    /// Label search, already trimmed and lower-cased; `None` matches everything.
    search: Option<String>,
    /// Exact-match categorical constraints.
    categorical: CategoricalFilters,
    /// Minimum qualifying ratings per item.
    min_sample_count: usize,
}

impl Default for RankFilters {
    fn default() -> Self {
        Self {
            search: None,
            categorical: CategoricalFilters::new(),
            min_sample_count: DEFAULT_MIN_SAMPLE_COUNT,
        }
    }
}

impl RankFilters {
    /// Build filters from their parts.
    #[must_use]
    pub fn new(search: Option<&str>, categorical: CategoricalFilters, min_sample_count: usize) -> Self {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        Self {
            search,
            categorical,
            min_sample_count,
        }
    }

    /// Filters carried by a query.
    #[must_use]
    pub fn from_query(query: &RankQuery) -> Self {
        Self::new(query.search.as_deref(), query.filters.clone(), query.min_sample_count)
    }

    /// Whether an aggregate passes every filter.
    #[must_use]
    pub fn matches(&self, ranking: &AggregatedRanking) -> bool {
        if ranking.sample_count < self.min_sample_count {
            return false;
        }

        if let Some(needle) = &self.search {
            if !ranking.label.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }

        self.categorical.iter().all(|(field, wanted)| {
            is_unconstrained(wanted) || ranking.field(*field) == Some(wanted.as_str())
        })
    }
}

/// Leaderboard order: mean desc, then sample count desc, then label asc.
#[must_use]
pub fn compare_rankings(a: &AggregatedRanking, b: &AggregatedRanking) -> Ordering {
    b.mean_rating
        .total_cmp(&a.mean_rating)
        .then_with(|| b.sample_count.cmp(&a.sample_count))
        .then_with(|| a.label.cmp(&b.label))
}

/// Filtered, ordered, truncated rankings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedPage {
    /// At most `limit` entries in leaderboard order.
    pub results: Vec<AggregatedRanking>,
    /// Entries that passed the filters before truncation.
    pub total_before_limit: usize,
}

/// Filter, sort, and truncate aggregated rankings.
///
/// An empty page is a normal outcome.
#[must_use]
pub fn rank(aggregated: Vec<AggregatedRanking>, filters: &RankFilters, limit: usize) -> RankedPage {
    let input = aggregated.len();
    let mut results: Vec<AggregatedRanking> =
        aggregated.into_iter().filter(|ranking| filters.matches(ranking)).collect();

    results.sort_by(compare_rankings);
    let total_before_limit = results.len();
    results.truncate(limit);

    tracing::debug!(
        input,
        matched = total_before_limit,
        returned = results.len(),
        "ranked aggregates"
    );

    RankedPage {
        results,
        total_before_limit,
    }
}
