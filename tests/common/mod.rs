#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use muistuttaja::components::desktop_notify::{
    NotificationHandle, NotificationRequest, NotificationSink,
};
use muistuttaja::components::google_calendar::models::{
    EventDateTime, RawAttendee, RawReminder, RawReminders, WorkingLocationProperties,
};
use muistuttaja::components::google_calendar::{CalendarSource, EventList, EventQuery, RawEvent};
use muistuttaja::components::working_location::{StatusSink, WorkingLocation};
use muistuttaja::error::{google_calendar_error, notification_error, slack_error, DaemonResult};
use muistuttaja::utils::browser::LinkOpener;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// Calendar returning whatever events were last set
#[derive(Default)]
pub struct MockCalendar {
    events: Mutex<EventList>,
    fail: AtomicBool,
    queries: Mutex<Vec<EventQuery>>,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_events(&self, items: Vec<RawEvent>) {
        self.events.lock().unwrap().items = items;
    }

    pub fn set_default_reminders(&self, minutes: &[i64]) {
        self.events.lock().unwrap().default_reminders = reminders(minutes);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<EventQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarSource for MockCalendar {
    async fn list_events(&self, query: EventQuery) -> DaemonResult<EventList> {
        self.queries.lock().unwrap().push(query);
        if self.fail.load(Ordering::SeqCst) {
            return Err(google_calendar_error("connection reset"));
        }
        Ok(self.events.lock().unwrap().clone())
    }
}

/// Notification sink recording every call
pub struct RecordingSink {
    next_handle: AtomicU32,
    fail: AtomicBool,
    sent: Mutex<Vec<NotificationRequest>>,
    closed: Mutex<Vec<NotificationHandle>>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            next_handle: AtomicU32::new(1),
            fail: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<NotificationHandle> {
        self.closed.lock().unwrap().clone()
    }

    /// Total number of calls made against the sink
    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len() + self.closed.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, request: NotificationRequest) -> DaemonResult<NotificationHandle> {
        self.sent.lock().unwrap().push(request);
        if self.fail.load(Ordering::SeqCst) {
            return Err(notification_error("no notification server"));
        }
        Ok(self.next_handle.fetch_add(1, Ordering::SeqCst))
    }

    async fn close(&self, handle: NotificationHandle) -> DaemonResult<()> {
        self.closed.lock().unwrap().push(handle);
        Ok(())
    }
}

/// Status sink recording pushed locations
#[derive(Default)]
pub struct RecordingStatus {
    fail: AtomicBool,
    calls: Mutex<Vec<WorkingLocation>>,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<WorkingLocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusSink for RecordingStatus {
    async fn set_status(&self, location: WorkingLocation) -> DaemonResult<()> {
        self.calls.lock().unwrap().push(location);
        if self.fail.load(Ordering::SeqCst) {
            return Err(slack_error("invalid_auth"));
        }
        Ok(())
    }
}

/// Link opener remembering opened URLs
#[derive(Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&self, url: &str) -> DaemonResult<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub fn reminders(minutes: &[i64]) -> Vec<RawReminder> {
    minutes
        .iter()
        .map(|m| RawReminder {
            method: "popup".to_string(),
            minutes: *m,
        })
        .collect()
}

/// A confirmed timed event with reminder overrides
pub fn timed_event(
    id: &str,
    summary: &str,
    start: DateTime<Utc>,
    length: Duration,
    reminder_minutes: &[i64],
) -> RawEvent {
    RawEvent {
        id: id.to_string(),
        status: "confirmed".to_string(),
        summary: summary.to_string(),
        description: format!("{} description", summary),
        start: EventDateTime {
            date_time: Some(start.to_rfc3339()),
            ..Default::default()
        },
        end: EventDateTime {
            date_time: Some((start + length).to_rfc3339()),
            ..Default::default()
        },
        html_link: Some(format!("https://calendar.example/event?eid={}", id)),
        reminders: RawReminders {
            use_default: false,
            overrides: reminders(reminder_minutes),
        },
        event_type: "default".to_string(),
        ..Default::default()
    }
}

/// Mark the user as having declined the event
pub fn declined(mut event: RawEvent) -> RawEvent {
    event.attendees.push(RawAttendee {
        email: "me@example.com".to_string(),
        is_self: true,
        response_status: "declined".to_string(),
    });
    event
}

/// An all-day working location entry
pub fn working_location(id: &str, kind: &str, start: &str, end: &str) -> RawEvent {
    RawEvent {
        id: id.to_string(),
        status: "confirmed".to_string(),
        start: EventDateTime {
            date: Some(start.to_string()),
            ..Default::default()
        },
        end: EventDateTime {
            date: Some(end.to_string()),
            ..Default::default()
        },
        event_type: "workingLocation".to_string(),
        working_location_properties: Some(WorkingLocationProperties {
            kind: kind.to_string(),
        }),
        ..Default::default()
    }
}

/// Fixed reference instant used as an event start
pub fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2030-01-07T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}
