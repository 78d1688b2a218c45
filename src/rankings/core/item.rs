//! Catalog items and their derived labels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rankings::core::fields::FilterField;
use crate::rankings::core::ids::ItemId;
use crate::rankings::core::lenient::{optional_text, scalar_key};

/// A catalog entry that can be rated.
///
/// `brand` and `expression` are the display fields; every other column the
/// catalog carries lands in the open `metadata` bag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item key.
    #[serde(deserialize_with = "scalar_key")]
    pub id: ItemId,
    /// Primary display field.
    #[serde(default, deserialize_with = "optional_text")]
    pub brand: Option<String>,
    /// Secondary display field.
    #[serde(default, deserialize_with = "optional_text")]
    pub expression: Option<String>,
    /// Open set of categorical and descriptive fields.
    #[serde(flatten)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Item {
    /// Create an item with display fields and no metadata.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, brand: &str, expression: Option<&str>) -> Self {
        Self {
            id: id.into(),
            brand: Some(brand.to_string()),
            expression: expression.map(str::to_string),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata field.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(name.to_string(), value.into());
        self
    }

    /// Human-readable label, `"<brand> - <expression>"` or just the brand.
    #[must_use]
    pub fn label(&self) -> String {
        item_label(self.brand.as_deref(), self.expression.as_deref())
    }

    /// Text value of a metadata field; nulls and blank strings count as absent.
    #[must_use]
    pub fn field_text(&self, name: &str) -> Option<String> {
        metadata_text(self.metadata.get(name)?)
    }

    /// Text value of a filterable field.
    #[must_use]
    pub fn filter_value(&self, field: FilterField) -> Option<String> {
        self.field_text(field.as_str())
    }

    /// Metadata rendered as text, absent values dropped.
    #[must_use]
    pub fn metadata_strings(&self) -> BTreeMap<String, String> {
        self.metadata
            .iter()
            .filter_map(|(name, value)| Some((name.clone(), metadata_text(value)?)))
            .collect()
    }
}

/// Build a display label from primary and secondary descriptors.
#[must_use]
pub fn item_label(primary: Option<&str>, secondary: Option<&str>) -> String {
    let primary = primary.unwrap_or_default().trim();
    let secondary = secondary.unwrap_or_default().trim();
    if secondary.is_empty() {
        primary.to_string()
    } else {
        format!("{primary} - {secondary}")
    }
}

fn metadata_text(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::Null => return None,
        serde_json::Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_label_formats() {
        assert_eq!(item_label(Some("Blanton's"), Some("Single Barrel")), "Blanton's - Single Barrel");
        assert_eq!(item_label(Some(" Weller "), Some("   ")), "Weller");
        assert_eq!(item_label(Some("Weller"), None), "Weller");
        assert_eq!(item_label(None, Some("12 Year")), " - 12 Year");
    }

    #[test]
    fn test_catalog_row_flattens_into_metadata() {
        let row = json!({
            "id": "b1",
            "brand": "Old Forester",
            "expression": "1920",
            "category": "Core",
            "mashbill_style": "High Rye",
            "proof": 115,
            "distillery": null,
            "barrel_type": "  "
        });
        let item: Item = serde_json::from_value(row).unwrap();

        assert_eq!(item.label(), "Old Forester - 1920");
        assert_eq!(item.filter_value(FilterField::Category).as_deref(), Some("Core"));
        assert_eq!(item.filter_value(FilterField::Proof).as_deref(), Some("115"));
        assert_eq!(item.filter_value(FilterField::Distillery), None);
        assert_eq!(item.filter_value(FilterField::BarrelType), None);

        let strings = item.metadata_strings();
        assert_eq!(strings.len(), 3);
        assert!(!strings.contains_key("id"));
    }
}
