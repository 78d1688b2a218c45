//! Snapshot sources: the collaborators that hand the engine its inputs.
//!
//! Sources may pre-filter with coarse predicates (rating present, author,
//! tag). The engine re-applies every filter, so a pre-filtered snapshot and
//! an unfiltered one rank identically.

pub mod json_file;
pub mod sqlite;

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rankings::core::errors::RankingResult;
use crate::rankings::core::event::RatingEvent;
use crate::rankings::core::ids::ItemId;
use crate::rankings::core::item::Item;
use crate::rankings::core::lenient::skip_malformed;
use crate::rankings::core::query::{RankQuery, Scope};
use crate::rankings::pipeline::engine::{Leaderboard, rank_items};

pub use json_file::JsonSnapshotSource;
pub use sqlite::SqliteSnapshotSource;

/// Boxed future type for snapshot source operations.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Coarse event predicates a source may apply before handing events over.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventPredicate {
    /// Author scope.
    pub scope: Scope,
    /// Exact tag, already trimmed.
    pub tag: Option<String>,
}

impl EventPredicate {
    /// Predicates implied by a query.
    #[must_use]
    pub fn from_query(query: &RankQuery) -> Self {
        Self {
            scope: query.scope.clone(),
            tag: query.tag_filter().map(str::to_string),
        }
    }

    /// Whether an event passes: rating present, author and tag match.
    #[must_use]
    pub fn admits(&self, event: &RatingEvent) -> bool {
        event.rating.is_some()
            && self.scope.admits(event.author_id.as_ref())
            && self
                .tag
                .as_deref()
                .is_none_or(|tag| event.tag.as_deref() == Some(tag))
    }
}

/// Provider of rating events and catalog entries.
pub trait SnapshotSource: Send + Sync {
    /// Fetch rating events, optionally pre-filtered by `predicate`.
    ///
    /// # Errors
    /// Returns an error if the source cannot be read.
    fn fetch_events<'a>(
        &'a self,
        predicate: &'a EventPredicate,
    ) -> SourceFuture<'a, RankingResult<Vec<RatingEvent>>>;

    /// Fetch catalog entries for a set of ids. Unknown ids are skipped.
    ///
    /// # Errors
    /// Returns an error if the source cannot be read.
    fn fetch_items<'a>(&'a self, ids: &'a [ItemId]) -> SourceFuture<'a, RankingResult<Vec<Item>>>;

    /// Fetch matching events and the catalog entries they reference.
    ///
    /// Sources that read one document should override this to read it once.
    ///
    /// # Errors
    /// Returns an error if either fetch fails.
    fn fetch_snapshot<'a>(
        &'a self,
        predicate: &'a EventPredicate,
    ) -> SourceFuture<'a, RankingResult<Snapshot>> {
        Box::pin(async move {
            let events = self.fetch_events(predicate).await?;
            let ids = referenced_ids(&events);
            let items = if ids.is_empty() {
                Vec::new()
            } else {
                self.fetch_items(&ids).await?
            };
            Ok(Snapshot { events, items })
        })
    }
}

/// Distinct item ids referenced by `events`, sorted.
#[must_use]
pub fn referenced_ids(events: &[RatingEvent]) -> Vec<ItemId> {
    events
        .iter()
        .filter_map(|event| event.item_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// In-memory snapshot of events and catalog entries.
///
/// This is also the on-disk JSON layout read by [`JsonSnapshotSource`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Rating events; entries that are not event objects are skipped.
    #[serde(default, deserialize_with = "skip_malformed")]
    pub events: Vec<RatingEvent>,
    /// Catalog entries; entries without a usable id are skipped.
    #[serde(default, deserialize_with = "skip_malformed")]
    pub items: Vec<Item>,
}

impl Snapshot {
    /// Events passing the coarse predicates.
    #[must_use]
    pub fn matching_events(&self, predicate: &EventPredicate) -> Vec<RatingEvent> {
        self.events
            .iter()
            .filter(|event| predicate.admits(event))
            .cloned()
            .collect()
    }

    /// Catalog entries whose id is in `ids`.
    #[must_use]
    pub fn items_for(&self, ids: &[ItemId]) -> Vec<Item> {
        let wanted: BTreeSet<&ItemId> = ids.iter().collect();
        self.items
            .iter()
            .filter(|item| wanted.contains(&item.id))
            .cloned()
            .collect()
    }
}

impl SnapshotSource for Snapshot {
    fn fetch_events<'a>(
        &'a self,
        predicate: &'a EventPredicate,
    ) -> SourceFuture<'a, RankingResult<Vec<RatingEvent>>> {
        Box::pin(async move { Ok(self.matching_events(predicate)) })
    }

    fn fetch_items<'a>(&'a self, ids: &'a [ItemId]) -> SourceFuture<'a, RankingResult<Vec<Item>>> {
        Box::pin(async move { Ok(self.items_for(ids)) })
    }
}

/// Fetch the events a query needs and the catalog entries they reference.
///
/// # Errors
/// Returns an error if either fetch fails.
pub async fn fetch_snapshot(source: &dyn SnapshotSource, query: &RankQuery) -> RankingResult<Snapshot> {
    let predicate = EventPredicate::from_query(query);
    let snapshot = source.fetch_snapshot(&predicate).await?;

    tracing::info!(
        events = snapshot.events.len(),
        items = snapshot.items.len(),
        "fetched snapshot"
    );
    Ok(snapshot)
}

/// Fetch a snapshot for a query and rank it.
///
/// # Errors
/// Returns a fetch error from the source, or a query validation error.
pub async fn fetch_and_rank(
    source: &dyn SnapshotSource,
    query: &RankQuery,
    now: DateTime<Utc>,
) -> RankingResult<Leaderboard> {
    query.validate()?;
    let snapshot = fetch_snapshot(source, query).await?;
    rank_items(&snapshot.events, &snapshot.items, query, now)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::rankings::core::ids::AuthorId;

    fn snapshot() -> Snapshot {
        Snapshot {
            events: vec![
                RatingEvent::new("x", 8.0).with_author("me").with_tag("RYES"),
                RatingEvent::new("x", 6.0).with_author("you"),
                RatingEvent::new("y", 9.0).with_author("me"),
                RatingEvent::new("y", "n/a").with_author("me").with_tag("RYES"),
                RatingEvent { rating: None, ..RatingEvent::new("z", 1.0) },
            ],
            items: vec![
                Item::new("x", "Xander", None),
                Item::new("y", "Yellowstone", None),
                Item::new("z", "Zeppelin", None),
            ],
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn test_predicate_is_coarse() {
        let predicate = EventPredicate {
            scope: Scope::Author(AuthorId::new("me")),
            tag: Some("RYES".to_string()),
        };
        let events = snapshot().matching_events(&predicate);

        // The non-numeric rating is still handed over; the selector drops it.
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_snapshot_only_loads_referenced_items() {
        let source = snapshot();
        let query = RankQuery::new().with_scope(Scope::Author(AuthorId::new("me")));

        let fetched = fetch_snapshot(&source, &query).await.unwrap();
        let ids: Vec<&str> = fetched.items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_prefiltered_and_raw_snapshots_rank_identically() {
        let source = snapshot();
        for query in [
            RankQuery::new(),
            RankQuery::new().with_tag("RYES"),
            RankQuery::new().with_scope(Scope::Author(AuthorId::new("me"))),
        ] {
            let via_source = fetch_and_rank(&source, &query, now()).await.unwrap();
            let raw = rank_items(&source.events, &source.items, &query, now()).unwrap();
            assert_eq!(via_source, raw);
        }
    }
}
