//! Tolerant deserializers for collaborator-written records.
//!
//! Snapshot writers are not trusted to keep field types straight. A value of
//! the wrong shape loses that field (or, for a required key, the record)
//! instead of failing the whole snapshot.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Text form of a scalar: strings as-is, numbers in their JSON spelling.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Optional text field; numbers are kept as their text, other shapes become `None`.
///
/// # Errors
/// Only fails if the input is not valid JSON.
pub fn optional_text<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).map(T::from))
}

/// Required key field; numbers are kept as their text.
///
/// # Errors
/// Fails when the value is neither a string nor a number.
pub fn scalar_key<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let value = Value::deserialize(deserializer)?;
    let kind = value_kind(&value);
    scalar_text(value)
        .map(T::from)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a string or number key, got {kind}")))
}

/// List whose malformed entries are dropped rather than rejected.
///
/// # Errors
/// Fails only if the list itself is not a JSON array.
pub fn skip_malformed<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Vec<Value> = Vec::deserialize(deserializer)?;
    let total = raw.len();
    let kept: Vec<T> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!(error = %err, "skipping malformed snapshot entry");
                None
            }
        })
        .collect();

    if kept.len() < total {
        tracing::warn!(skipped = total - kept.len(), total, "snapshot had malformed entries");
    }
    Ok(kept)
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(deserialize_with = "scalar_key")]
        id: String,
        #[serde(default, deserialize_with = "optional_text")]
        note: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct Rows {
        #[serde(deserialize_with = "skip_malformed")]
        rows: Vec<Row>,
    }

    #[test]
    fn test_scalars_become_text() {
        let row: Row = serde_json::from_str(r#"{"id": 42, "note": 1718000000}"#).unwrap();
        assert_eq!(row.id, "42");
        assert_eq!(row.note.as_deref(), Some("1718000000"));
    }

    #[test]
    fn test_other_shapes_drop_the_field() {
        let row: Row = serde_json::from_str(r#"{"id": "a", "note": {"nested": true}}"#).unwrap();
        assert_eq!(row.note, None);

        let row: Row = serde_json::from_str(r#"{"id": "b", "note": false}"#).unwrap();
        assert_eq!(row.note, None);
    }

    #[test]
    fn test_unusable_keys_drop_the_entry() {
        let rows: Rows = serde_json::from_str(
            r#"{"rows": [{"id": "a"}, {"id": [1, 2]}, "junk", {"note": "no id"}, {"id": 7}]}"#,
        )
        .unwrap();
        let ids: Vec<&str> = rows.rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "7"]);
    }
}
