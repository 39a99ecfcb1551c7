mod actor;
mod handle;
pub mod models;
pub mod time;
pub mod token;

pub use handle::GoogleCalendarHandle;
pub use models::{EventList, EventType, RawEvent};

use crate::error::DaemonResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Time window and filters of an events query
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
    /// Expand recurring events into single occurrences
    pub single_events: bool,
    /// Restrict to these event types; empty means the calendar's default set
    pub event_types: Vec<EventType>,
}

impl EventQuery {
    /// Timed events (recurrences expanded) in `[time_min, time_max]`
    pub fn timed(time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> Self {
        Self {
            time_min,
            time_max,
            single_events: true,
            event_types: Vec::new(),
        }
    }

    /// Working location entries in `[time_min, time_max]`
    pub fn working_location(time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> Self {
        Self {
            time_min,
            time_max,
            single_events: true,
            event_types: vec![EventType::WorkingLocation],
        }
    }
}

/// Read-only source of calendar events
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Events intersecting the query window, in source order
    async fn list_events(&self, query: EventQuery) -> DaemonResult<EventList>;
}
