use crate::calc::dates::to_local_date;
use crate::data::PointEvent;
use chrono::{Local, NaiveDate, TimeZone};
use std::collections::HashMap;

/// Events drawn per calendar day before collapsing the rest into "+N".
pub const MAX_VISIBLE_EVENTS: usize = 3;

/// Groups events by the local calendar day of their timestamp.
pub fn group_by_day(events: &[PointEvent]) -> HashMap<NaiveDate, Vec<&PointEvent>> {
    group_by_day_in(events, &Local)
}

/// Same as [`group_by_day`] in an explicit time zone. Input order is kept
/// within each day.
pub fn group_by_day_in<'a, Tz: TimeZone>(
    events: &'a [PointEvent],
    tz: &Tz,
) -> HashMap<NaiveDate, Vec<&'a PointEvent>> {
    let mut map: HashMap<NaiveDate, Vec<&PointEvent>> = HashMap::new();
    for event in events {
        map.entry(to_local_date(&event.ts, tz)).or_default().push(event);
    }
    map
}

/// What a single day cell shows for its events.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DayOverlay<'a> {
    pub shown: Vec<&'a PointEvent>,
    /// Events beyond [`MAX_VISIBLE_EVENTS`]; `None` when nothing was cut.
    pub overflow: Option<usize>,
}

impl<'a> DayOverlay<'a> {
    pub fn from_events(events: &[&'a PointEvent]) -> Self {
        let shown: Vec<&PointEvent> = events.iter().take(MAX_VISIBLE_EVENTS).copied().collect();
        let rest = events.len().saturating_sub(MAX_VISIBLE_EVENTS);
        DayOverlay {
            shown,
            overflow: (rest > 0).then_some(rest),
        }
    }

    pub fn total(&self) -> usize {
        self.shown.len() + self.overflow.unwrap_or(0)
    }

    pub fn overflow_label(&self) -> Option<String> {
        self.overflow.map(|n| format!("+{n}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn ev(ts: &str, note: &str) -> PointEvent {
        PointEvent::new(DateTime::parse_from_rfc3339(ts).unwrap(), false, Some(note))
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_group_by_day_groups_and_keeps_order() {
        let events = vec![
            ev("2025-09-01T08:00:00Z", "a"),
            ev("2025-09-02T08:00:00Z", "b"),
            ev("2025-09-01T21:00:00Z", "c"),
        ];
        let map = group_by_day_in(&events, &utc());
        assert_eq!(map.len(), 2);
        let first: Vec<_> = map[&d(2025, 9, 1)].iter().map(|e| e.notes.as_deref().unwrap()).collect();
        assert_eq!(first, vec!["a", "c"]);
        assert_eq!(map[&d(2025, 9, 2)].len(), 1);
    }

    #[test]
    fn test_group_by_day_uses_viewer_zone_not_event_zone() {
        // 23:30 in New York is already the next day in UTC.
        let events = vec![ev("2025-09-01T23:30:00-04:00", "late")];
        let in_utc = group_by_day_in(&events, &utc());
        assert!(in_utc.contains_key(&d(2025, 9, 2)));
        let new_york = FixedOffset::west_opt(4 * 3600).unwrap();
        let in_ny = group_by_day_in(&events, &new_york);
        assert!(in_ny.contains_key(&d(2025, 9, 1)));
    }

    #[test]
    fn test_group_by_day_never_drops_events() {
        let events: Vec<PointEvent> = (0..50)
            .map(|i| ev(&format!("2025-09-{:02}T{:02}:15:00Z", 1 + i % 7, i % 24), "x"))
            .collect();
        let map = group_by_day_in(&events, &utc());
        let total: usize = map.values().map(Vec::len).sum();
        assert_eq!(total, events.len());
    }

    #[test]
    fn test_group_by_day_empty() {
        assert!(group_by_day_in(&[], &utc()).is_empty());
        assert!(group_by_day(&[]).is_empty());
    }

    #[test]
    fn test_overlay_truncates_after_three() {
        let events: Vec<PointEvent> = (0..5).map(|i| ev("2025-09-01T10:00:00Z", &i.to_string())).collect();
        for k in 0..=5 {
            let refs: Vec<&PointEvent> = events.iter().take(k).collect();
            let overlay = DayOverlay::from_events(&refs);
            assert_eq!(overlay.shown.len(), k.min(3));
            assert_eq!(overlay.total(), k);
            if k > 3 {
                assert_eq!(overlay.overflow, Some(k - 3));
                assert_eq!(overlay.overflow_label(), Some(format!("+{}", k - 3)));
            } else {
                assert_eq!(overlay.overflow, None);
                assert_eq!(overlay.overflow_label(), None);
            }
        }
    }

    #[test]
    fn test_overlay_shows_the_first_events() {
        let events: Vec<PointEvent> = ["a", "b", "c", "d"].iter().map(|n| ev("2025-09-01T10:00:00Z", n)).collect();
        let refs: Vec<&PointEvent> = events.iter().collect();
        let overlay = DayOverlay::from_events(&refs);
        let notes: Vec<_> = overlay.shown.iter().map(|e| e.notes.as_deref().unwrap()).collect();
        assert_eq!(notes, vec!["a", "b", "c"]);
    }
}
