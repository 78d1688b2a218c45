//! `SQLite` snapshot source with coarse server-side predicates.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::types::Value;
use tokio_rusqlite::Connection;

use crate::rankings::core::errors::RankingResult;
use crate::rankings::core::event::{RatingEvent, RawRating};
use crate::rankings::core::fields::FilterField;
use crate::rankings::core::ids::{AuthorId, ItemId};
use crate::rankings::core::item::Item;
use crate::rankings::core::query::Scope;
use crate::rankings::source::{EventPredicate, SnapshotSource, SourceFuture};

/// Ids per `IN (...)` lookup.
const ID_CHUNK: usize = 500;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS items (
        id TEXT PRIMARY KEY,
        brand TEXT,
        expression TEXT,
        category,
        mashbill_style,
        proof,
        distillery,
        distillery_location,
        barrel_type
    );
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        item_id TEXT,
        rating,
        occurred_at TEXT,
        tag TEXT,
        author_id TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_events_item ON events (item_id);
";

/// Snapshot source backed by `events` and `items` tables.
///
/// Metadata columns carry no affinity, so `"107.0"` stays text and `107`
/// stays an integer. The `rating` column is untyped too, so whatever a writer stored (numbers,
/// numeric text, junk) reaches the selector as-is.
pub struct SqliteSnapshotSource {
    conn: Connection,
}

impl SqliteSnapshotSource {
    /// Open (and create if needed) a database file.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open(path: impl AsRef<Path>) -> RankingResult<Self> {
        let conn = Connection::open(path.as_ref()).await?;
        Self::init(conn).await
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub async fn open_in_memory() -> RankingResult<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> RankingResult<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }

    /// Insert or replace a catalog entry.
    ///
    /// Only [`FilterField`] columns are stored besides the display fields.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn insert_item(&self, item: &Item) -> RankingResult<()> {
        let mut values: Vec<Value> = vec![
            Value::Text(item.id.to_string()),
            optional_text(item.brand.as_deref()),
            optional_text(item.expression.as_deref()),
        ];
        values.extend(
            FilterField::ALL
                .iter()
                .map(|field| item.metadata.get(field.as_str()).map_or(Value::Null, json_to_sql)),
        );
        let columns = FilterField::ALL.map(FilterField::as_str).join(", ");

        self.conn
            .call(move |conn| {
                conn.execute(
                    &format!(
                        "INSERT OR REPLACE INTO items (id, brand, expression, {columns})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                    ),
                    rusqlite::params_from_iter(values),
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Append a rating event.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn insert_event(&self, event: &RatingEvent) -> RankingResult<()> {
        let values = vec![
            optional_text(event.item_id.as_ref().map(ItemId::as_str)),
            event.rating.as_ref().map_or(Value::Null, rating_to_sql),
            optional_text(event.occurred_at.as_deref()),
            optional_text(event.tag.as_deref()),
            optional_text(event.author_id.as_ref().map(AuthorId::as_str)),
        ];

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO events (item_id, rating, occurred_at, tag, author_id)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params_from_iter(values),
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

impl SnapshotSource for SqliteSnapshotSource {
    fn fetch_events<'a>(
        &'a self,
        predicate: &'a EventPredicate,
    ) -> SourceFuture<'a, RankingResult<Vec<RatingEvent>>> {
        Box::pin(async move {
            let mut sql = String::from(
                "SELECT item_id, rating, occurred_at, tag, author_id FROM events WHERE rating IS NOT NULL",
            );
            let mut params: Vec<String> = Vec::new();
            if let Scope::Author(author) = &predicate.scope {
                params.push(author.to_string());
                sql.push_str(&format!(" AND author_id = ?{}", params.len()));
            }
            if let Some(tag) = &predicate.tag {
                params.push(tag.clone());
                sql.push_str(&format!(" AND tag = ?{}", params.len()));
            }
            sql.push_str(" ORDER BY id");

            let events = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt.query_map(rusqlite::params_from_iter(params), |row| {
                        let item_id: Option<String> = row.get(0)?;
                        let rating: Value = row.get(1)?;
                        let occurred_at: Option<String> = row.get(2)?;
                        let tag: Option<String> = row.get(3)?;
                        let author_id: Option<String> = row.get(4)?;
                        Ok(RatingEvent {
                            item_id: item_id.map(ItemId::from),
                            rating: sql_to_rating(rating),
                            occurred_at,
                            tag,
                            author_id: author_id.map(AuthorId::from),
                        })
                    })?;
                    Ok(rows.collect::<Result<Vec<_>, rusqlite::Error>>()?)
                })
                .await?;

            tracing::debug!(events = events.len(), "fetched events from sqlite");
            Ok(events)
        })
    }

    fn fetch_items<'a>(&'a self, ids: &'a [ItemId]) -> SourceFuture<'a, RankingResult<Vec<Item>>> {
        Box::pin(async move {
            let mut items = Vec::with_capacity(ids.len());
            for chunk in ids.chunks(ID_CHUNK) {
                let chunk: Vec<String> = chunk.iter().map(ToString::to_string).collect();
                let fetched = self
                    .conn
                    .call(move |conn| {
                        let placeholders = vec!["?"; chunk.len()].join(", ");
                        let columns = FilterField::ALL.map(FilterField::as_str).join(", ");
                        let mut stmt = conn.prepare(&format!(
                            "SELECT id, brand, expression, {columns} FROM items WHERE id IN ({placeholders})"
                        ))?;
                        let rows = stmt.query_map(rusqlite::params_from_iter(chunk), |row| {
                            let id: String = row.get(0)?;
                            let brand: Option<String> = row.get(1)?;
                            let expression: Option<String> = row.get(2)?;
                            let mut metadata = BTreeMap::new();
                            for (offset, field) in FilterField::ALL.iter().enumerate() {
                                let value: Value = row.get(3 + offset)?;
                                if let Some(json) = sql_to_json(value) {
                                    metadata.insert(field.as_str().to_string(), json);
                                }
                            }
                            Ok(Item {
                                id: ItemId::from(id),
                                brand,
                                expression,
                                metadata,
                            })
                        })?;
                        Ok(rows.collect::<Result<Vec<_>, rusqlite::Error>>()?)
                    })
                    .await?;
                items.extend(fetched);
            }

            tracing::debug!(requested = ids.len(), found = items.len(), "fetched items from sqlite");
            Ok(items)
        })
    }
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

fn json_to_sql(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(flag) => Value::Text(flag.to_string()),
        serde_json::Value::Number(number) => number
            .as_i64()
            .map(Value::Integer)
            .or_else(|| number.as_f64().map(Value::Real))
            .unwrap_or(Value::Null),
        serde_json::Value::String(text) => Value::Text(text.clone()),
        other => Value::Text(other.to_string()),
    }
}

fn rating_to_sql(rating: &RawRating) -> Value {
    match rating {
        RawRating::Number(value) => Value::Real(*value),
        RawRating::Text(text) => Value::Text(text.clone()),
        RawRating::Other(value) => json_to_sql(value),
    }
}

#[allow(clippy::cast_precision_loss)] // Integer ratings are small
fn sql_to_rating(value: Value) -> Option<RawRating> {
    match value {
        Value::Null => None,
        Value::Integer(number) => Some(RawRating::Number(number as f64)),
        Value::Real(number) => Some(RawRating::Number(number)),
        Value::Text(text) => Some(RawRating::Text(text)),
        Value::Blob(_) => Some(RawRating::Other(serde_json::Value::Null)),
    }
}

fn sql_to_json(value: Value) -> Option<serde_json::Value> {
    match value {
        Value::Null | Value::Blob(_) => None,
        Value::Integer(number) => Some(number.into()),
        Value::Real(number) => serde_json::Number::from_f64(number).map(serde_json::Value::Number),
        Value::Text(text) => Some(text.into()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    use super::*;
    use crate::rankings::core::query::{RankQuery, TimeWindow};
    use crate::rankings::pipeline::engine::rank_items;
    use crate::rankings::source::{Snapshot, fetch_and_rank};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).single().unwrap()
    }

    fn fixture() -> Snapshot {
        Snapshot {
            events: vec![
                RatingEvent::new("b1", 8.0).with_author("me").with_tag("RYES").at(now() - TimeDelta::days(1)),
                RatingEvent::new("b1", "6").with_author("you").at(now() - TimeDelta::days(20)),
                RatingEvent::new("b2", 9.0).with_author("me").at_raw("not a date"),
                RatingEvent::new("b2", "n/a").with_author("me").with_tag("RYES"),
                RatingEvent::new("ghost", 10.0),
                RatingEvent { item_id: None, ..RatingEvent::new("b1", 4.0) },
            ],
            items: vec![
                Item::new("b1", "Old Forester", Some("1920"))
                    .with_field("category", "Core")
                    .with_field("proof", 115),
                Item::new("b2", "Weller", Some("12 Year"))
                    .with_field("category", "Allocated")
                    .with_field("mashbill_style", "Wheated"),
            ],
        }
    }

    async fn seeded() -> SqliteSnapshotSource {
        let source = SqliteSnapshotSource::open_in_memory().await.unwrap();
        let snapshot = fixture();
        for item in &snapshot.items {
            source.insert_item(item).await.unwrap();
        }
        for event in &snapshot.events {
            source.insert_event(event).await.unwrap();
        }
        source
    }

    #[tokio::test]
    async fn test_round_trips_loose_ratings() {
        let source = seeded().await;
        let events = source.fetch_events(&EventPredicate::default()).await.unwrap();

        assert_eq!(events.len(), 6);
        assert_eq!(events[1].rating_value(), Some(6.0));
        assert_eq!(events[3].rating_value(), None);
        assert_eq!(events[5].item_id, None);
    }

    #[tokio::test]
    async fn test_items_keep_metadata() {
        let source = seeded().await;
        let items = source
            .fetch_items(&[ItemId::new("b1"), ItemId::new("ghost")])
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label(), "Old Forester - 1920");
        assert_eq!(items[0].filter_value(FilterField::Category).as_deref(), Some("Core"));
        assert_eq!(items[0].filter_value(FilterField::Proof).as_deref(), Some("115"));
        assert_eq!(items[0].filter_value(FilterField::MashbillStyle), None);
    }

    #[tokio::test]
    async fn test_server_side_predicates_match_engine_filters() {
        let source = seeded().await;
        let mut snapshot = fixture();
        let extras = [
            Item::new("b3", "Wild Turkey", Some("Rare Breed")).with_field("proof", "107.0"),
            Item::new("b4", "Knob Creek", None)
                .with_field("proof", 107.0)
                .with_field("barrel_type", true),
        ];
        for item in extras {
            let event = RatingEvent::new(item.id.clone(), 8.0);
            source.insert_item(&item).await.unwrap();
            source.insert_event(&event).await.unwrap();
            snapshot.items.push(item);
            snapshot.events.push(event);
        }

        for query in [
            RankQuery::new(),
            RankQuery::new().with_tag("RYES"),
            RankQuery::new().with_scope(Scope::Author(AuthorId::new("me"))),
            RankQuery::new().with_window(TimeWindow::LastDays(7)),
            RankQuery::new().with_filter(FilterField::Category, "Core"),
            RankQuery::new().with_filter(FilterField::Proof, "107.0"),
            RankQuery::new().with_filter(FilterField::Proof, "115"),
            RankQuery::new().with_filter(FilterField::BarrelType, "true"),
        ] {
            let via_sqlite = fetch_and_rank(&source, &query, now()).await.unwrap();
            let in_memory = rank_items(&snapshot.events, &snapshot.items, &query, now()).unwrap();
            assert_eq!(via_sqlite, in_memory);
        }

        let proof = RankQuery::new().with_filter(FilterField::Proof, "107.0");
        let board = fetch_and_rank(&source, &proof, now()).await.unwrap();
        assert_eq!(board.results.len(), 2);
    }
}
