//! Filterable catalog fields.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rankings::core::errors::{RankingError, RankingResult};

/// Value meaning "no constraint" for a categorical filter.
pub const ANY_VALUE: &str = "All";

/// Catalog fields that may be used as exact-match filters.
///
/// Lookup against an item is dynamic (by [`FilterField::as_str`]), but the set
/// of accepted names is closed so a typo fails instead of matching nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    /// Release category (core, limited, allocated, craft, sourced).
    Category,
    /// Mashbill style classifier.
    MashbillStyle,
    /// Bottling proof.
    Proof,
    /// Producing distillery.
    Distillery,
    /// Distillery location.
    DistilleryLocation,
    /// Barrel type or finish.
    BarrelType,
}

impl FilterField {
    /// Every filterable field.
    pub const ALL: [Self; 6] = [
        Self::Category,
        Self::MashbillStyle,
        Self::Proof,
        Self::Distillery,
        Self::DistilleryLocation,
        Self::BarrelType,
    ];

    /// Metadata key for this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::MashbillStyle => "mashbill_style",
            Self::Proof => "proof",
            Self::Distillery => "distillery",
            Self::DistilleryLocation => "distillery_location",
            Self::BarrelType => "barrel_type",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterField {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == key)
            .ok_or_else(|| RankingError::UnknownFilterField(s.to_string()))
    }
}

/// Exact-match constraints keyed by field.
pub type CategoricalFilters = BTreeMap<FilterField, String>;

/// Build categorical filters from loosely typed `(name, value)` pairs.
///
/// # Errors
/// Returns [`RankingError::UnknownFilterField`] for a name outside [`FilterField`].
pub fn parse_filters<I, K, V>(pairs: I) -> RankingResult<CategoricalFilters>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(name, value)| -> RankingResult<(FilterField, String)> {
            Ok((name.as_ref().parse()?, value.into()))
        })
        .collect()
}

/// Parse a `field=value` expression (CLI syntax).
///
/// # Errors
/// Returns an error if the `=` is missing or the field is unknown.
pub fn parse_filter_expr(expr: &str) -> RankingResult<(FilterField, String)> {
    let (name, value) = expr.split_once('=').ok_or_else(|| {
        RankingError::InvalidQuery(format!("filter must look like field=value, got {expr:?}"))
    })?;
    Ok((name.parse()?, value.trim().to_string()))
}

/// Whether a filter value leaves its field unconstrained.
#[must_use]
pub fn is_unconstrained(value: &str) -> bool {
    value == ANY_VALUE
}
