use serde::Deserialize;

/// Calendar entry from the calendar list
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    pub background_color: Option<String>,
}

/// Start or end of an event. Timed events carry `date_time`, all-day events only `date`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

/// Simplified calendar event representation
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
}

impl CalendarEvent {
    /// Build a timed event from two RFC 3339 timestamps
    pub fn timed(id: &str, start: &str, end: &str) -> Self {
        Self {
            id: id.to_string(),
            summary: None,
            start: EventTime {
                date_time: Some(start.to_string()),
                date: None,
            },
            end: EventTime {
                date_time: Some(end.to_string()),
                date: None,
            },
        }
    }

    /// Build an all-day event spanning `start` to `end` (dates, end exclusive)
    pub fn all_day(id: &str, start: &str, end: &str) -> Self {
        Self {
            id: id.to_string(),
            summary: None,
            start: EventTime {
                date_time: None,
                date: Some(start.to_string()),
            },
            end: EventTime {
                date_time: None,
                date: Some(end.to_string()),
            },
        }
    }
}

/// One page of `calendarList.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalendarListPage {
    #[serde(default)]
    pub items: Vec<Calendar>,
    pub next_page_token: Option<String>,
}

/// One page of `events.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventsPage {
    #[serde(default)]
    pub items: Vec<CalendarEvent>,
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_list_item_deserializes() {
        let json = r##"{
            "kind": "calendar#calendarListEntry",
            "id": "work@group.calendar.google.com",
            "summary": "Work",
            "backgroundColor": "#9fe1e7",
            "accessRole": "owner"
        }"##;
        let calendar: Calendar = serde_json::from_str(json).unwrap();
        assert_eq!(calendar.id, "work@group.calendar.google.com");
        assert_eq!(calendar.summary, "Work");
        assert_eq!(calendar.background_color.as_deref(), Some("#9fe1e7"));
    }

    #[test]
    fn all_day_event_has_no_date_time() {
        let json = r#"{
            "id": "holiday",
            "start": { "date": "2024-01-01" },
            "end": { "date": "2024-01-02" }
        }"#;
        let event: CalendarEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, CalendarEvent::all_day("holiday", "2024-01-01", "2024-01-02"));
    }
}
