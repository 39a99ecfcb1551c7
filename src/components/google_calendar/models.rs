use serde::{Deserialize, Serialize};

/// Event status as reported by the calendar
pub const STATUS_CANCELLED: &str = "cancelled";
/// Attendee response marking the user as not attending
pub const RESPONSE_DECLINED: &str = "declined";

/// Calendar event types that can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    WorkingLocation,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::WorkingLocation => "workingLocation",
        }
    }
}

/// One page (or the merged pages) of an events list response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventList {
    pub items: Vec<RawEvent>,
    /// Calendar-wide reminders used by events with `useDefault`
    pub default_reminders: Vec<RawReminder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Calendar event record as delivered by the API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEvent {
    pub id: String,
    pub status: String,
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub original_start_time: Option<EventDateTime>,
    pub recurring_event_id: Option<String>,
    pub attendees: Vec<RawAttendee>,
    pub hangout_link: Option<String>,
    pub html_link: Option<String>,
    pub location: String,
    pub reminders: RawReminders,
    pub event_type: String,
    pub working_location_properties: Option<WorkingLocationProperties>,
}

/// Either a timed (`dateTime`) or an all-day (`date`) point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDateTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAttendee {
    pub email: String,
    #[serde(rename = "self")]
    pub is_self: bool,
    pub response_status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawReminders {
    pub use_default: bool,
    pub overrides: Vec<RawReminder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReminder {
    #[serde(default)]
    pub method: String,
    pub minutes: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkingLocationProperties {
    #[serde(rename = "type")]
    pub kind: String,
}

impl RawEvent {
    /// Whether the event was cancelled by its organizer
    pub fn is_cancelled(&self) -> bool {
        self.status == STATUS_CANCELLED
    }

    /// False only when the user explicitly declined
    pub fn is_attending(&self) -> bool {
        !self
            .attendees
            .iter()
            .any(|a| a.is_self && a.response_status == RESPONSE_DECLINED)
    }

    /// Reminders that apply to this event: overrides, or the calendar defaults
    pub fn effective_reminders<'a>(&'a self, defaults: &'a [RawReminder]) -> &'a [RawReminder] {
        if self.reminders.use_default {
            defaults
        } else {
            &self.reminders.overrides
        }
    }
}
