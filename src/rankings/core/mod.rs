//! Core ranking types and identifiers.

pub mod config;
pub mod errors;
pub mod event;
pub mod fields;
pub mod ids;
pub mod item;
pub mod lenient;
pub mod query;
pub mod tags;

pub use config::{QueryDefaults, RankingsConfig, ServerConfig, SourceConfig};
pub use errors::{RankingError, RankingResult};
pub use event::{RatingEvent, RawRating, parse_timestamp};
pub use fields::{ANY_VALUE, CategoricalFilters, FilterField, parse_filter_expr, parse_filters};
pub use ids::{AuthorId, ItemId};
pub use item::{Item, item_label};
pub use query::{DEFAULT_LIMIT, DEFAULT_MIN_SAMPLE_COUNT, RankQuery, Scope, TimeWindow};
pub use tags::{DEFAULT_TAGS, normalize_tag, popular_tags};
