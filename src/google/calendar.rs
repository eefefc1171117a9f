//! Google Calendar API client
//!
//! Lists and creates events on the primary calendar.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::config::google::CALENDAR_ID;
use crate::error::Result;
use crate::google::services::ServiceClient;
use crate::google::types::{Event, EventDateTime, EventList, NewEvent};

/// Calendar v3 client
pub struct CalendarService {
    client: ServiceClient,
}

impl CalendarService {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    fn events_path() -> String {
        format!("calendars/{}/events", urlencoding::encode(CALENDAR_ID))
    }

    /// List single-instance events starting at `time_min`, ordered by start time
    pub async fn list_events(&self, time_min: &str, max_results: u32) -> Result<EventList> {
        let query = [
            ("timeMin", time_min.to_string()),
            ("maxResults", max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];

        self.client
            .get_json("events.list", &Self::events_path(), &query)
            .await
    }

    /// Insert an event and return the created resource
    pub async fn insert_event(&self, event: &NewEvent) -> Result<Event> {
        self.client
            .post_json("events.insert", &Self::events_path(), event)
            .await
    }
}

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Lower bound for event listing: `now` minus `days_back` days, as an
/// ISO-8601 UTC timestamp with millisecond precision.
///
/// Returns `None` when the result falls outside the representable date range.
pub fn time_min(now: DateTime<Utc>, days_back: f64) -> Option<String> {
    let millis = days_back * MILLIS_PER_DAY;
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }

    let offset = Duration::try_milliseconds(millis as i64)?;
    now.checked_sub_signed(offset)
        .map(|since| since.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Turn a `YYYY-MM-DDTHH:MM` wall-clock string into an event time in `time_zone`
pub fn wall_clock_time(value: &str, time_zone: &str) -> EventDateTime {
    EventDateTime {
        date_time: Some(format!("{}:00", value)),
        date: None,
        time_zone: Some(time_zone.to_string()),
    }
}
