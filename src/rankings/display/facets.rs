//! Filter options derived from the aggregated set.

use std::collections::{BTreeMap, BTreeSet};

use crate::rankings::core::fields::FilterField;
use crate::rankings::pipeline::aggregator::AggregatedRanking;

/// Sorted distinct non-empty values of a field across rankings.
///
/// Renderers prepend [`ANY_VALUE`](crate::rankings::core::fields::ANY_VALUE)
/// to offer "no constraint".
#[must_use]
pub fn facet_values(rankings: &[AggregatedRanking], field: FilterField) -> Vec<String> {
    rankings
        .iter()
        .filter_map(|ranking| ranking.field(field))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Facet values for each of the given fields.
#[must_use]
pub fn facets(rankings: &[AggregatedRanking], fields: &[FilterField]) -> BTreeMap<FilterField, Vec<String>> {
    fields
        .iter()
        .map(|field| (*field, facet_values(rankings, *field)))
        .collect()
}
