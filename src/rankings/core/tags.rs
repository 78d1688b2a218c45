//! Tag normalization and popularity.
//!
//! The selector compares tags verbatim; these helpers are for the edges that
//! accept a typed tag from a person or suggest tags to pick from.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::rankings::core::errors::{RankingError, RankingResult};
use crate::rankings::core::event::RatingEvent;

/// Suggestions used when no event carries a tag yet.
pub const DEFAULT_TAGS: [&str; 10] = [
    "ACTION",
    "VEGAS_TRIP",
    "SPEAKEASY",
    "BUDGET_HEAT",
    "DATE_NIGHT",
    "NEW_BOTTLE",
    "RYES",
    "BOURBON",
    "FINISH_FWD",
    "CIGAR",
];

struct TagPatterns {
    whitespace: Regex,
    disallowed: Regex,
}

static TAG_PATTERNS: OnceLock<TagPatterns> = OnceLock::new();

/// Normalize a tag: collapse whitespace, drop punctuation, underscores for
/// spaces, no leading/trailing separators, upper case.
///
/// # Errors
/// Returns an error if the internal patterns fail to compile.
pub fn normalize_tag(raw: &str) -> RankingResult<String> {
    let patterns = tag_patterns()?;
    let collapsed = patterns.whitespace.replace_all(raw.trim(), " ");
    let cleaned = patterns.disallowed.replace_all(&collapsed, "");
    let underscored = cleaned.replace(' ', "_");
    Ok(underscored.trim_matches(['_', '-']).to_uppercase())
}

/// Most frequent normalized tags, ties broken alphabetically.
///
/// # Errors
/// Returns an error if tag normalization fails.
pub fn popular_tags(events: &[RatingEvent], limit: usize) -> RankingResult<Vec<String>> {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for tag in events.iter().filter_map(|event| event.tag.as_deref()) {
        let normalized = normalize_tag(tag)?;
        if !normalized.is_empty() {
            *freq.entry(normalized).or_default() += 1;
        }
    }

    if freq.is_empty() {
        return Ok(DEFAULT_TAGS.iter().take(limit).map(ToString::to_string).collect());
    }

    let mut tags: Vec<(String, usize)> = freq.into_iter().collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(tags.into_iter().take(limit).map(|(tag, _)| tag).collect())
}

fn tag_patterns() -> RankingResult<&'static TagPatterns> {
    if let Some(patterns) = TAG_PATTERNS.get() {
        return Ok(patterns);
    }
    let compiled = TagPatterns {
        whitespace: compile(r"\s+")?,
        disallowed: compile(r"[^A-Za-z0-9 _-]")?,
    };
    Ok(TAG_PATTERNS.get_or_init(|| compiled))
}

fn compile(pattern: &str) -> RankingResult<Regex> {
    Regex::new(pattern).map_err(|err| RankingError::InvalidConfig(format!("invalid regex: {err}")))
}
