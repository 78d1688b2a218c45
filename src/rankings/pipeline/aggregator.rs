//! Per-item aggregation and catalog join.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::rankings::core::fields::FilterField;
use crate::rankings::core::ids::ItemId;
use crate::rankings::core::item::Item;
use crate::rankings::pipeline::selector::SelectedRating;

/// Aggregate rating of one item over the selected events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRanking {
    /// Rated item.
    pub item_id: ItemId,
    /// Display label derived from the catalog entry.
    pub label: String,
    /// Arithmetic mean of the qualifying ratings.
    pub mean_rating: f64,
    /// Number of qualifying ratings, never zero.
    pub sample_count: usize,
    /// Catalog metadata rendered as text.
    pub metadata: BTreeMap<String, String>,
}

impl AggregatedRanking {
    /// Text value of a filterable field.
    #[must_use]
    pub fn field(&self, field: FilterField) -> Option<&str> {
        self.metadata.get(field.as_str()).map(String::as_str)
    }
}

struct Accumulator<'a> {
    item_id: &'a ItemId,
    sum: f64,
    count: usize,
}

/// Group selected ratings by item and join them with the catalog.
///
/// Output follows first appearance in `selected`. Items missing from the
/// catalog are dropped; the rest of the run is unaffected.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Sample counts are far below 2^52
pub fn aggregate(selected: &[SelectedRating<'_>], catalog: &[Item]) -> Vec<AggregatedRanking> {
    let mut index: HashMap<&ItemId, usize> = HashMap::new();
    let mut groups: Vec<Accumulator<'_>> = Vec::new();

    for rating in selected {
        let slot = *index.entry(rating.item_id).or_insert_with(|| {
            groups.push(Accumulator {
                item_id: rating.item_id,
                sum: 0.0,
                count: 0,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.sum += rating.rating;
        group.count += 1;
    }

    let mut items: HashMap<&ItemId, &Item> = HashMap::with_capacity(catalog.len());
    for item in catalog {
        items.entry(&item.id).or_insert(item);
    }

    let group_count = groups.len();
    let rankings: Vec<AggregatedRanking> = groups
        .into_iter()
        .filter_map(|group| {
            let item = items.get(group.item_id)?;
            Some(AggregatedRanking {
                item_id: group.item_id.clone(),
                label: item.label(),
                mean_rating: group.sum / group.count as f64,
                sample_count: group.count,
                metadata: item.metadata_strings(),
            })
        })
        .collect();

    if rankings.len() < group_count {
        tracing::debug!(
            dropped = group_count - rankings.len(),
            "rated items missing from catalog"
        );
    }
    tracing::debug!(groups = group_count, joined = rankings.len(), "aggregated ratings");
    rankings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected<'a>(pairs: &[(&'a ItemId, f64)]) -> Vec<SelectedRating<'a>> {
        pairs
            .iter()
            .map(|&(item_id, rating)| SelectedRating { item_id, rating })
            .collect()
    }

    #[test]
    fn test_mean_and_count() {
        let x = ItemId::new("x");
        let y = ItemId::new("y");
        let catalog = vec![Item::new("x", "Xander", None), Item::new("y", "Yellowstone", Some("Limited"))];

        let rankings = aggregate(&selected(&[(&x, 8.0), (&y, 9.0), (&x, 6.0), (&x, 7.5)]), &catalog);

        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings[0].item_id, x);
        assert_eq!(rankings[0].sample_count, 3);
        assert!((rankings[0].mean_rating - (8.0 + 6.0 + 7.5) / 3.0).abs() < 1e-12);
        assert_eq!(rankings[1].label, "Yellowstone - Limited");
        assert_eq!(rankings[1].sample_count, 1);
    }

    #[test]
    fn test_missing_catalog_entry_is_omitted() {
        let x = ItemId::new("x");
        let ghost = ItemId::new("ghost");
        let catalog = vec![Item::new("x", "Xander", None)];

        let rankings = aggregate(&selected(&[(&ghost, 10.0), (&x, 5.0)]), &catalog);

        assert_eq!(rankings.len(), 1);
        assert_eq!(rankings[0].item_id, x);
    }

    #[test]
    fn test_items_without_ratings_never_appear() {
        let catalog = vec![Item::new("x", "Xander", None), Item::new("y", "Yellowstone", None)];
        assert!(aggregate(&[], &catalog).is_empty());
    }

    #[test]
    fn test_metadata_carried_for_filtering() {
        let x = ItemId::new("x");
        let catalog = vec![Item::new("x", "Xander", None).with_field("category", "Craft").with_field("proof", 101.5)];

        let rankings = aggregate(&selected(&[(&x, 5.0)]), &catalog);

        assert_eq!(rankings[0].field(FilterField::Category), Some("Craft"));
        assert_eq!(rankings[0].field(FilterField::Proof), Some("101.5"));
        assert_eq!(rankings[0].field(FilterField::BarrelType), None);
    }
}
