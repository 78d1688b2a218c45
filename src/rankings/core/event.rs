//! Rating events as produced by collaborators.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rankings::core::ids::{AuthorId, ItemId};
use crate::rankings::core::lenient::optional_text;

/// Naive timestamp layouts accepted in addition to RFC 3339; read as UTC.
const NAIVE_LAYOUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Rating value as stored by the event writer.
///
/// Ratings arrive loosely typed: numbers, numeric strings, or junk. Only
/// values that parse to a finite float take part in aggregation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRating {
    /// Numeric rating.
    Number(f64),
    /// Textual rating, numeric only if it parses after trimming.
    Text(String),
    /// Anything else (booleans, objects, arrays).
    Other(serde_json::Value),
}

impl RawRating {
    /// Finite numeric value of this rating, if any.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
            Self::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawRating {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawRating {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One rated occasion for an item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingEvent {
    /// Item being rated; events without one never count.
    #[serde(default, deserialize_with = "optional_text")]
    pub item_id: Option<ItemId>,
    /// Raw rating value.
    #[serde(default)]
    pub rating: Option<RawRating>,
    /// Raw timestamp of the occasion.
    #[serde(default, deserialize_with = "optional_text")]
    pub occurred_at: Option<String>,
    /// Optional normalized tag.
    #[serde(default, deserialize_with = "optional_text")]
    pub tag: Option<String>,
    /// Optional author (device token).
    #[serde(default, deserialize_with = "optional_text")]
    pub author_id: Option<AuthorId>,
}

impl RatingEvent {
    /// Create an event for an item with a numeric rating.
    #[must_use]
    pub fn new(item_id: impl Into<ItemId>, rating: impl Into<RawRating>) -> Self {
        Self {
            item_id: Some(item_id.into()),
            rating: Some(rating.into()),
            ..Self::default()
        }
    }

    /// Attach a timestamp.
    #[must_use]
    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at.to_rfc3339());
        self
    }

    /// Attach a raw timestamp string, parseable or not.
    #[must_use]
    pub fn at_raw(mut self, occurred_at: impl Into<String>) -> Self {
        self.occurred_at = Some(occurred_at.into());
        self
    }

    /// Attach a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Attach an author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<AuthorId>) -> Self {
        self.author_id = Some(author.into());
        self
    }

    /// Finite numeric rating, if the event carries one.
    #[must_use]
    pub fn rating_value(&self) -> Option<f64> {
        self.rating.as_ref().and_then(RawRating::value)
    }

    /// Parsed timestamp in UTC, if present and well-formed.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.occurred_at.as_deref()?)
    }
}

/// Parse an event timestamp: RFC 3339 first, then naive layouts taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .map(|naive| naive.and_utc())
}
