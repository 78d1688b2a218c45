//! Event selection: scope, time window, tag, and rating validity.

use chrono::{DateTime, Utc};

use crate::rankings::core::event::RatingEvent;
use crate::rankings::core::ids::ItemId;
use crate::rankings::core::query::{Scope, TimeWindow};

/// An event that passed selection, reduced to what aggregation needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectedRating<'a> {
    /// Rated item.
    pub item_id: &'a ItemId,
    /// Finite rating value.
    pub rating: f64,
}

/// Filter events by scope, window and tag, dropping unusable ones.
///
/// Events with no item reference or no finite rating are skipped whatever the
/// other filters say. Nothing here fails: malformed events just don't pass.
#[must_use]
pub fn select<'a>(
    events: &'a [RatingEvent],
    scope: &Scope,
    window: TimeWindow,
    tag: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<SelectedRating<'a>> {
    let selected: Vec<SelectedRating<'a>> = events
        .iter()
        .filter(|event| scope.admits(event.author_id.as_ref()))
        .filter(|event| tag.is_none_or(|wanted| event.tag.as_deref() == Some(wanted)))
        .filter(|event| window == TimeWindow::AllTime || window.contains(event.timestamp(), now))
        .filter_map(|event| {
            Some(SelectedRating {
                item_id: event.item_id.as_ref()?,
                rating: event.rating_value()?,
            })
        })
        .collect();

    tracing::debug!(
        input = events.len(),
        selected = selected.len(),
        "selected rating events"
    );
    selected
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;
    use crate::rankings::core::event::RawRating;
    use crate::rankings::core::ids::AuthorId;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).single().unwrap()
    }

    fn ids(selected: &[SelectedRating<'_>]) -> Vec<String> {
        selected.iter().map(|s| s.item_id.to_string()).collect()
    }

    #[test]
    fn test_drops_unusable_events() {
        let events = vec![
            RatingEvent::new("a", 8.0),
            RatingEvent::new("b", "n/a"),
            RatingEvent { item_id: None, rating: Some(RawRating::Number(9.0)), ..RatingEvent::default() },
            RatingEvent { item_id: Some(ItemId::new("c")), rating: None, ..RatingEvent::default() },
            RatingEvent::new("d", "7.5"),
        ];

        let selected = select(&events, &Scope::All, TimeWindow::AllTime, None, now());
        assert_eq!(ids(&selected), vec!["a", "d"]);
        assert!((selected[1].rating - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_author_scope() {
        let events = vec![
            RatingEvent::new("a", 8.0).with_author("me"),
            RatingEvent::new("b", 8.0).with_author("you"),
            RatingEvent::new("c", 8.0),
        ];
        let scope = Scope::Author(AuthorId::new("me"));

        let selected = select(&events, &scope, TimeWindow::AllTime, None, now());
        assert_eq!(ids(&selected), vec!["a"]);
    }

    #[test]
    fn test_tag_is_exact_and_case_sensitive() {
        let events = vec![
            RatingEvent::new("a", 8.0).with_tag("RYES"),
            RatingEvent::new("b", 8.0).with_tag("ryes"),
            RatingEvent::new("c", 8.0),
        ];

        let selected = select(&events, &Scope::All, TimeWindow::AllTime, Some("RYES"), now());
        assert_eq!(ids(&selected), vec!["a"]);
    }

    #[test]
    fn test_window_excludes_old_and_undated_events() {
        let events = vec![
            RatingEvent::new("old", 8.0).at(now() - TimeDelta::days(10)),
            RatingEvent::new("recent", 8.0).at(now() - TimeDelta::days(1)),
            RatingEvent::new("undated", 8.0),
            RatingEvent::new("garbled", 8.0).at_raw("last tuesday"),
        ];

        let windowed = select(&events, &Scope::All, TimeWindow::LastDays(7), None, now());
        assert_eq!(ids(&windowed), vec!["recent"]);

        let all_time = select(&events, &Scope::All, TimeWindow::AllTime, None, now());
        assert_eq!(all_time.len(), 4);
    }
}
