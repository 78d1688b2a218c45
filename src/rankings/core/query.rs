//! Self-contained ranking query: scope, window, filters and result size.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::rankings::core::errors::{RankingError, RankingResult};
use crate::rankings::core::fields::{CategoricalFilters, FilterField};
use crate::rankings::core::ids::AuthorId;

/// Default number of leaderboard entries.
pub const DEFAULT_LIMIT: usize = 50;

/// Default minimum number of qualifying ratings per item.
pub const DEFAULT_MIN_SAMPLE_COUNT: usize = 1;

/// Which authors' events take part in the ranking.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Every author (global board).
    #[default]
    All,
    /// A single author's events only.
    Author(AuthorId),
}

impl Scope {
    /// Whether an event with this author passes the scope.
    #[must_use]
    pub fn admits(&self, author: Option<&AuthorId>) -> bool {
        match self {
            Self::All => true,
            Self::Author(expected) => author == Some(expected),
        }
    }

    /// Short label for summaries.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::All => "Global".to_string(),
            Self::Author(author) => format!("Author ({author})"),
        }
    }
}

impl FromStr for Scope {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("global") {
            return Ok(Self::All);
        }
        match s.split_once(':') {
            Some((kind, author)) if kind.eq_ignore_ascii_case("author") && !author.trim().is_empty() => {
                Ok(Self::Author(AuthorId::new(author.trim())))
            }
            _ => Err(RankingError::InvalidScope(s.to_string())),
        }
    }
}

/// Interval ending "now" used to filter events by timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindow {
    /// Unbounded; timestamps are ignored.
    #[default]
    #[serde(rename = "all")]
    AllTime,
    /// The last `n` days up to and including now.
    #[serde(rename = "days")]
    LastDays(u32),
}

impl TimeWindow {
    /// Windows offered by leaderboard pickers.
    pub const PRESETS: [Self; 4] = [
        Self::AllTime,
        Self::LastDays(7),
        Self::LastDays(30),
        Self::LastDays(90),
    ];

    /// Lower bound of the window for a given evaluation instant.
    ///
    /// `None` for all-time, and for spans reaching past the earliest
    /// representable instant.
    #[must_use]
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::AllTime => None,
            Self::LastDays(days) => now.checked_sub_signed(TimeDelta::days(i64::from(days))),
        }
    }

    /// Whether an event timestamp falls inside the window.
    ///
    /// Missing timestamps only pass the unbounded window.
    #[must_use]
    pub fn contains(self, timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match self {
            Self::AllTime => true,
            Self::LastDays(_) => timestamp.is_some_and(|ts| {
                ts <= now && self.since(now).is_none_or(|start| ts >= start)
            }),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllTime => f.write_str("All time"),
            Self::LastDays(days) => write!(f, "Last {days} days"),
        }
    }
}

impl FromStr for TimeWindow {
    type Err = RankingError;

    /// Accepts `all`, `all-time`, `7`, `7d`, `30 days`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        if matches!(raw.as_str(), "all" | "all-time" | "all_time" | "all time") {
            return Ok(Self::AllTime);
        }
        let digits = raw
            .trim_end_matches("days")
            .trim_end_matches("day")
            .trim_end_matches('d')
            .trim();
        match digits.parse::<u32>() {
            Ok(days) if days > 0 => Ok(Self::LastDays(days)),
            _ => Err(RankingError::InvalidTimeWindow(s.to_string())),
        }
    }
}

/// Complete, self-contained parameters for one ranking run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankQuery {
    /// Author scope.
    pub scope: Scope,
    /// Time window ending at the evaluation instant.
    pub window: TimeWindow,
    /// Exact-match tag filter; blank means none.
    pub tag: Option<String>,
    /// Case-insensitive label search; blank means none.
    pub search: Option<String>,
    /// Exact-match categorical filters.
    pub filters: CategoricalFilters,
    /// Minimum qualifying ratings per item (>= 1).
    pub min_sample_count: usize,
    /// Maximum number of results (> 0).
    pub limit: usize,
}

impl Default for RankQuery {
    fn default() -> Self {
        Self {
            scope: Scope::All,
            window: TimeWindow::AllTime,
            tag: None,
            search: None,
            filters: CategoricalFilters::new(),
            min_sample_count: DEFAULT_MIN_SAMPLE_COUNT,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl RankQuery {
    /// Create a query with defaults (global, all time, top 50).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Restrict to a time window.
    #[must_use]
    pub const fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Restrict to a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Search labels.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Add a categorical constraint.
    #[must_use]
    pub fn with_filter(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.filters.insert(field, value.into());
        self
    }

    /// Set the minimum sample count.
    #[must_use]
    pub const fn with_min_sample_count(mut self, min_sample_count: usize) -> Self {
        self.min_sample_count = min_sample_count;
        self
    }

    /// Set the result limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Tag filter after trimming, if any.
    #[must_use]
    pub fn tag_filter(&self) -> Option<&str> {
        self.tag.as_deref().map(str::trim).filter(|tag| !tag.is_empty())
    }

    /// Validate query invariants.
    ///
    /// # Errors
    /// Returns an error for a zero limit, a zero minimum sample count, or an
    /// empty day window.
    pub fn validate(&self) -> RankingResult<()> {
        if self.limit == 0 {
            return Err(RankingError::InvalidQuery("limit must be > 0".to_string()));
        }

        if self.min_sample_count == 0 {
            return Err(RankingError::InvalidQuery(
                "min_sample_count must be >= 1".to_string(),
            ));
        }

        if self.window == TimeWindow::LastDays(0) {
            return Err(RankingError::InvalidTimeWindow(
                "day window must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = TimeWindow::LastDays(7);
        let start = now() - TimeDelta::days(7);

        assert!(window.contains(Some(start), now()));
        assert!(window.contains(Some(now()), now()));
        assert!(!window.contains(Some(start - TimeDelta::seconds(1)), now()));
        assert!(!window.contains(Some(now() + TimeDelta::seconds(1)), now()));
        assert!(!window.contains(None, now()));
        assert!(TimeWindow::AllTime.contains(None, now()));
    }

    #[test]
    fn test_window_parsing() {
        assert_eq!("all".parse::<TimeWindow>().unwrap(), TimeWindow::AllTime);
        assert_eq!("7d".parse::<TimeWindow>().unwrap(), TimeWindow::LastDays(7));
        assert_eq!("30 days".parse::<TimeWindow>().unwrap(), TimeWindow::LastDays(30));
        assert_eq!("90".parse::<TimeWindow>().unwrap(), TimeWindow::LastDays(90));
        assert!("0d".parse::<TimeWindow>().is_err());
        assert!("fortnight".parse::<TimeWindow>().is_err());
        assert_eq!(TimeWindow::LastDays(7).to_string(), "Last 7 days");
    }

    #[test]
    fn test_scope_parsing_and_admission() {
        let scope: Scope = "author:tok_1".parse().unwrap();
        assert!(scope.admits(Some(&AuthorId::new("tok_1"))));
        assert!(!scope.admits(Some(&AuthorId::new("tok_2"))));
        assert!(!scope.admits(None));
        assert!(Scope::All.admits(None));
        assert_eq!("global".parse::<Scope>().unwrap(), Scope::All);
        assert!("author:".parse::<Scope>().is_err());
    }

    #[test]
    fn test_query_json_shape() {
        let query: RankQuery = serde_json::from_str(
            r#"{"scope": {"author": "tok"}, "window": {"days": 30}, "filters": {"category": "Core"}, "limit": 10}"#,
        )
        .unwrap();

        assert_eq!(query.scope, Scope::Author(AuthorId::new("tok")));
        assert_eq!(query.window, TimeWindow::LastDays(30));
        assert_eq!(query.min_sample_count, DEFAULT_MIN_SAMPLE_COUNT);
        assert_eq!(query.limit, 10);

        let defaults: RankQuery = serde_json::from_str(r#"{"window": "all"}"#).unwrap();
        assert_eq!(defaults, RankQuery::default());
    }

    #[test]
    fn test_validate() {
        assert!(RankQuery::new().validate().is_ok());
        assert!(RankQuery::new().with_limit(0).validate().is_err());
        assert!(RankQuery::new().with_min_sample_count(0).validate().is_err());
        assert!(RankQuery::new().with_window(TimeWindow::LastDays(0)).validate().is_err());
    }

    #[test]
    fn test_blank_tag_is_no_filter() {
        assert_eq!(RankQuery::new().with_tag("   ").tag_filter(), None);
        assert_eq!(RankQuery::new().with_tag(" RYES ").tag_filter(), Some("RYES"));
    }
}
