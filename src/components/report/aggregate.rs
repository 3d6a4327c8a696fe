use crate::components::google_calendar::{Calendar, CalendarEvent, CalendarSource};
use crate::error::{parse_error, ReportResult};
use chrono::DateTime;
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::pin::pin;
use tracing::{debug, info, warn};

/// Hours spent per calendar, keyed by calendar id.
///
/// Each calendar id appears at most once, and only calendars that had at
/// least one timed event in the queried range are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSpent {
    hours: BTreeMap<String, f64>,
}

impl TimeSpent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `hours` to a calendar, starting from zero if it has no entry yet
    pub fn add(&mut self, calendar_id: &str, hours: f64) {
        *self.hours.entry(calendar_id.to_string()).or_insert(0.0) += hours;
    }

    pub fn get(&self, calendar_id: &str) -> Option<f64> {
        self.hours.get(calendar_id).copied()
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    pub fn total_hours(&self) -> f64 {
        self.hours.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.hours.iter().map(|(id, hours)| (id.as_str(), *hours))
    }
}

fn is_all_day(event: &CalendarEvent) -> bool {
    event.start.date_time.is_none() || event.end.date_time.is_none()
}

/// Duration of a timed event in hours.
///
/// Returns `None` for all-day events (no time of day) and for events that
/// end before they start.
pub fn event_hours(event: &CalendarEvent) -> ReportResult<Option<f64>> {
    let (Some(start), Some(end)) = (&event.start.date_time, &event.end.date_time) else {
        debug!("Skipping all-day event {}", event.id);
        return Ok(None);
    };

    let start = DateTime::parse_from_rfc3339(start).map_err(|e| {
        parse_error(&format!("Invalid start time '{}' on event {}: {}", start, event.id, e))
    })?;
    let end = DateTime::parse_from_rfc3339(end).map_err(|e| {
        parse_error(&format!("Invalid end time '{}' on event {}: {}", end, event.id, e))
    })?;

    let duration = end.signed_duration_since(start);
    if duration < chrono::Duration::zero() {
        warn!("Skipping event {} which ends before it starts", event.id);
        return Ok(None);
    }

    Ok(Some(duration.num_milliseconds() as f64 / 3_600_000.0))
}

/// How a calendar's events were treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EventTally {
    counted: usize,
    all_day: usize,
    backwards: usize,
}

/// Add a calendar's events to `time_spent`
fn add_events(time_spent: &mut TimeSpent, calendar_id: &str, events: &[CalendarEvent]) -> ReportResult<EventTally> {
    let mut tally = EventTally::default();
    for event in events {
        match event_hours(event)? {
            Some(hours) => {
                time_spent.add(calendar_id, hours);
                tally.counted += 1;
            }
            None if is_all_day(event) => tally.all_day += 1,
            None => tally.backwards += 1,
        }
    }

    if tally.all_day > 0 {
        debug!("Skipped {} events without a time of day in {}", tally.all_day, calendar_id);
    }
    if tally.backwards > 0 {
        warn!("Skipped {} events ending before they start in {}", tally.backwards, calendar_id);
    }
    Ok(tally)
}

/// Sum the events of every calendar into a [`TimeSpent`].
///
/// At most `concurrency` calendars are fetched at once. Results are consumed
/// in listing order, so the outcome does not depend on the concurrency level.
/// The first failing request aborts the whole aggregation.
pub async fn aggregate<S>(
    source: &S,
    calendars: &[Calendar],
    time_min: &DateTime<Tz>,
    time_max: &DateTime<Tz>,
    concurrency: usize,
) -> ReportResult<TimeSpent>
where
    S: CalendarSource + ?Sized,
{
    let mut time_spent = TimeSpent::new();

    let mut fetches = pin!(stream::iter(calendars)
        .map(move |calendar| async move {
            let events = source.list_events(&calendar.id, time_min, time_max).await?;
            Ok::<_, crate::error::Error>((calendar, events))
        })
        .buffered(concurrency.max(1)));

    while let Some(fetched) = fetches.next().await {
        let (calendar, events) = fetched?;
        let tally = add_events(&mut time_spent, &calendar.id, &events)?;
        if tally.counted > 0 {
            info!(
                "{}: {} events, {:.2} hours",
                calendar.summary,
                tally.counted,
                time_spent.get(&calendar.id).unwrap_or_default()
            );
        }
    }

    Ok(time_spent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_hours() {
        let event = CalendarEvent::timed("e1", "2024-01-01T09:00:00+08:00", "2024-01-01T10:30:00+08:00");
        assert_eq!(event_hours(&event).unwrap(), Some(1.5));

        // Offsets differ, absolute instants are 45 minutes apart
        let event = CalendarEvent::timed("e2", "2024-01-01T09:00:00+08:00", "2024-01-01T01:45:00Z");
        assert_eq!(event_hours(&event).unwrap(), Some(0.75));
    }

    #[test]
    fn test_all_day_event_is_skipped() {
        let event = CalendarEvent::all_day("holiday", "2024-01-01", "2024-01-02");
        assert_eq!(event_hours(&event).unwrap(), None);
    }

    #[test]
    fn test_backwards_event_is_skipped() {
        let event = CalendarEvent::timed("odd", "2024-01-01T10:00:00+08:00", "2024-01-01T09:00:00+08:00");
        assert_eq!(event_hours(&event).unwrap(), None);
    }

    #[test]
    fn test_malformed_time_is_parse_error() {
        let event = CalendarEvent::timed("bad", "yesterday", "2024-01-01T09:00:00+08:00");
        assert!(matches!(event_hours(&event), Err(crate::error::Error::Parse(_))));
    }

    #[test]
    fn test_zero_length_event_creates_entry() {
        let mut time_spent = TimeSpent::new();
        let events = vec![CalendarEvent::timed(
            "reminder",
            "2024-01-01T09:00:00+08:00",
            "2024-01-01T09:00:00+08:00",
        )];
        assert_eq!(add_events(&mut time_spent, "cal", &events).unwrap().counted, 1);
        assert_eq!(time_spent.get("cal"), Some(0.0));
    }

    #[test]
    fn test_only_all_day_events_creates_no_entry() {
        let mut time_spent = TimeSpent::new();
        let events = vec![CalendarEvent::all_day("h", "2024-01-01", "2024-01-02")];
        let tally = add_events(&mut time_spent, "cal", &events).unwrap();
        assert_eq!((tally.counted, tally.all_day), (0, 1));
        assert!(time_spent.is_empty());
    }

    #[test]
    fn test_skipped_events_are_counted_by_reason() {
        let mut time_spent = TimeSpent::new();
        let events = vec![
            CalendarEvent::timed("meeting", "2024-01-01T09:00:00+08:00", "2024-01-01T10:00:00+08:00"),
            CalendarEvent::all_day("holiday", "2024-01-01", "2024-01-02"),
            CalendarEvent::timed("odd", "2024-01-01T12:00:00+08:00", "2024-01-01T11:00:00+08:00"),
            CalendarEvent::timed("odd-2", "2024-01-01T15:00:00+08:00", "2024-01-01T14:30:00+08:00"),
        ];

        let tally = add_events(&mut time_spent, "cal", &events).unwrap();

        assert_eq!(
            tally,
            EventTally {
                counted: 1,
                all_day: 1,
                backwards: 2,
            }
        );
        assert_eq!(time_spent.get("cal"), Some(1.0));
    }

    #[test]
    fn test_time_spent_accumulates() {
        let mut time_spent = TimeSpent::new();
        time_spent.add("a", 1.5);
        time_spent.add("b", 0.5);
        time_spent.add("a", 2.25);

        assert_eq!(time_spent.len(), 2);
        assert_eq!(time_spent.get("a"), Some(3.75));
        assert_eq!(time_spent.total_hours(), 4.25);
        assert_eq!(
            time_spent.iter().collect::<Vec<_>>(),
            vec![("a", 3.75), ("b", 0.5)]
        );
    }
}
