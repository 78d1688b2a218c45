//! JSON snapshot file source.

use std::path::{Path, PathBuf};

use crate::rankings::core::errors::RankingResult;
use crate::rankings::core::event::RatingEvent;
use crate::rankings::core::ids::ItemId;
use crate::rankings::core::item::Item;
use crate::rankings::source::{
    EventPredicate, Snapshot, SnapshotSource, SourceFuture, referenced_ids,
};

/// Reads `{ "events": [...], "items": [...] }` from disk on every fetch.
#[derive(Clone, Debug)]
pub struct JsonSnapshotSource {
    path: PathBuf,
}

impl JsonSnapshotSource {
    /// Create a source for a snapshot file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole snapshot.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub async fn load(&self) -> RankingResult<Snapshot> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        tracing::debug!(
            path = %self.path.display(),
            events = snapshot.events.len(),
            items = snapshot.items.len(),
            "loaded snapshot file"
        );
        Ok(snapshot)
    }
}

impl SnapshotSource for JsonSnapshotSource {
    fn fetch_events<'a>(
        &'a self,
        predicate: &'a EventPredicate,
    ) -> SourceFuture<'a, RankingResult<Vec<RatingEvent>>> {
        Box::pin(async move { Ok(self.load().await?.matching_events(predicate)) })
    }

    fn fetch_items<'a>(&'a self, ids: &'a [ItemId]) -> SourceFuture<'a, RankingResult<Vec<Item>>> {
        Box::pin(async move { Ok(self.load().await?.items_for(ids)) })
    }

    fn fetch_snapshot<'a>(
        &'a self,
        predicate: &'a EventPredicate,
    ) -> SourceFuture<'a, RankingResult<Snapshot>> {
        Box::pin(async move {
            let loaded = self.load().await?;
            let events = loaded.matching_events(predicate);
            let items = loaded.items_for(&referenced_ids(&events));
            Ok(Snapshot { events, items })
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::rankings::core::errors::RankingError;
    use crate::rankings::core::query::{RankQuery, TimeWindow};
    use crate::rankings::source::fetch_and_rank;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("viscosity-{}-{name}.json", std::process::id()))
    }

    #[tokio::test]
    async fn test_reads_loose_snapshot() {
        let path = temp_path("loose");
        let raw = r#"{
            "events": [
                {"item_id": "b1", "rating": 8, "occurred_at": "2025-01-01T00:00:00Z", "tag": "RYES"},
                {"item_id": "b1", "rating": "n/a"},
                {"item_id": null, "rating": 9}
            ],
            "items": [
                {"id": "b1", "brand": "Old Forester", "expression": "1920", "category": "Core", "proof": 115}
            ]
        }"#;
        tokio::fs::write(&path, raw).await.unwrap();

        let source = JsonSnapshotSource::new(&path);
        let events = source.fetch_events(&EventPredicate::default()).await.unwrap();
        let items = source.fetch_items(&[ItemId::new("b1")]).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(events.len(), 3);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label(), "Old Forester - 1920");
    }

    #[tokio::test]
    async fn test_missing_file_is_a_fetch_failure() {
        let source = JsonSnapshotSource::new(temp_path("does-not-exist"));
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, RankingError::Io(_)));
        assert!(err.is_fetch_failure());
    }

    #[tokio::test]
    async fn test_mistyped_events_still_rank() {
        let path = temp_path("mistyped");
        let raw = r#"{
            "events": [
                {"item_id": "b1", "rating": 8},
                {"item_id": "b1", "rating": 6, "occurred_at": 1718000000},
                {"item_id": 42, "rating": 9, "tag": 7},
                "not an event"
            ],
            "items": [
                {"id": "b1", "brand": "Old Forester"},
                {"id": 42, "brand": "Blanton's", "expression": 1984},
                {"id": {"bad": "key"}, "brand": "Nobody"}
            ]
        }"#;
        tokio::fs::write(&path, raw).await.unwrap();

        let source = JsonSnapshotSource::new(&path);
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).single().unwrap();
        let all_time = fetch_and_rank(&source, &RankQuery::new(), now).await.unwrap();
        let windowed = fetch_and_rank(&source, &RankQuery::new().with_window(TimeWindow::LastDays(3650)), now)
            .await
            .unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        let labels: Vec<&str> = all_time.results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Blanton's - 1984", "Old Forester"]);
        assert_eq!(all_time.rated_events, 3);
        assert_eq!(all_time.results[1].sample_count, 2);
        // Events without a usable timestamp fall out of bounded windows.
        assert_eq!(windowed.rated_events, 0);
    }

    #[tokio::test]
    async fn test_snapshot_is_read_once_per_fetch() {
        let path = temp_path("single-read");
        let raw = r#"{"events": [{"item_id": "b1", "rating": 8}], "items": [{"id": "b1"}, {"id": "b2"}]}"#;
        tokio::fs::write(&path, raw).await.unwrap();

        let source = JsonSnapshotSource::new(&path);
        let snapshot = source.fetch_snapshot(&EventPredicate::default()).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(snapshot.events.len(), 1);
        let ids: Vec<&str> = snapshot.items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["b1"]);
    }
}
