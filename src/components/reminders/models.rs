use crate::components::desktop_notify::{
    IconHint, NotificationAction, NotificationHandle, NotificationRequest, DEFAULT_ACTION,
};
use crate::components::google_calendar::models::{RawEvent, RawReminder};
use crate::components::google_calendar::time::SeriesTimings;
use crate::components::google_calendar::EventList;
use crate::error::{validation_error, DaemonResult, Error};
use crate::utils::time::format_clock;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// A reminder attached to an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// How long before the start the reminder fires
    pub lead: Duration,
    /// Only ever goes from false to true
    pub fired: bool,
    /// Notification shown for this reminder, if sending succeeded
    pub handle: Option<NotificationHandle>,
}

impl Reminder {
    pub fn new(lead: Duration) -> Self {
        Self {
            lead,
            fired: false,
            handle: None,
        }
    }

    /// Whether the reminder should fire at `now` for an event starting at `start`
    pub fn is_due(&self, start: &DateTime<FixedOffset>, now: &DateTime<Utc>) -> bool {
        if self.fired {
            return false;
        }
        match start.checked_sub_signed(self.lead) {
            Some(due_at) => *now >= due_at,
            // Lead reaches before the representable range; always due
            None => true,
        }
    }
}

impl TryFrom<&RawReminder> for Reminder {
    type Error = Error;

    fn try_from(raw: &RawReminder) -> DaemonResult<Self> {
        Duration::try_minutes(raw.minutes)
            .map(Reminder::new)
            .ok_or_else(|| {
                validation_error(&format!(
                    "Reminder lead of {} minutes out of range",
                    raw.minutes
                ))
            })
    }
}

/// A timed calendar event being tracked for reminders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub conference_link: Option<String>,
    pub html_link: Option<String>,
    pub location: String,
    pub reminders: Vec<Reminder>,
}

impl Event {
    /// Build a tracked event with fresh reminders from a raw record
    pub fn from_raw(
        raw: &RawEvent,
        default_reminders: &[RawReminder],
        timings: &SeriesTimings,
    ) -> DaemonResult<Self> {
        let (start, end) = timings.resolve(raw)?;
        if start > end {
            return Err(validation_error(&format!(
                "Event {} ends ({}) before it starts ({})",
                raw.id, end, start
            )));
        }

        Ok(Self {
            id: raw.id.clone(),
            summary: raw.summary.clone(),
            description: raw.description.clone(),
            start,
            end,
            conference_link: non_empty(raw.hangout_link.as_deref()),
            html_link: non_empty(raw.html_link.as_deref()),
            location: raw.location.clone(),
            reminders: raw
                .effective_reminders(default_reminders)
                .iter()
                .map(Reminder::try_from)
                .collect::<DaemonResult<_>>()?,
        })
    }

    /// Equality ignoring reminder fired/handle state
    pub fn same_content(&self, other: &Event) -> bool {
        self.id == other.id
            && self.summary == other.summary
            && self.description == other.description
            && self.start == other.start
            && self.end == other.end
            && self.conference_link == other.conference_link
            && self.html_link == other.html_link
            && self.location == other.location
            && self.reminders.len() == other.reminders.len()
            && self
                .reminders
                .iter()
                .zip(&other.reminders)
                .all(|(a, b)| a.lead == b.lead)
    }

    /// Handles of every notification sent for this event
    pub fn fired_handles(&self) -> impl Iterator<Item = NotificationHandle> + '_ {
        self.reminders
            .iter()
            .filter(|r| r.fired)
            .filter_map(|r| r.handle)
    }

    pub fn has_ended(&self, now: &DateTime<Utc>) -> bool {
        self.end < *now
    }

    /// Link opened when the notification is clicked: the call first, then the event page
    pub fn preferred_link(&self) -> Option<&str> {
        self.conference_link
            .as_deref()
            .or(self.html_link.as_deref())
    }

    /// Notification announcing this event. Without a timezone the start is
    /// shown in the offset the calendar reported.
    pub fn notification(&self, tz: Option<&Tz>) -> NotificationRequest {
        NotificationRequest {
            title: format!("{} | {}", format_clock(&self.start, tz), self.summary),
            body: self.description.clone(),
            icon: if self.conference_link.is_some() {
                IconHint::VideoCall
            } else {
                IconHint::Calendar
            },
            actions: vec![NotificationAction {
                key: DEFAULT_ACTION.to_string(),
                label: "Default".to_string(),
            }],
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Why a fetched event is not tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Cancelled,
    Declined,
}

/// How one fetched record should affect the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    /// Event to track
    Active(Event),
    /// Present in the calendar, but not to be tracked
    Dropped { id: String, reason: DropReason },
    /// Record could not be interpreted; any tracked version is left alone
    Invalid { id: String },
}

impl Observed {
    pub fn id(&self) -> &str {
        match self {
            Observed::Active(event) => &event.id,
            Observed::Dropped { id, .. } | Observed::Invalid { id } => id,
        }
    }
}

/// Interpret a fetch result, in source order
pub fn observe(list: &EventList) -> Vec<Observed> {
    let timings = SeriesTimings::from_events(&list.items);
    list.items
        .iter()
        .map(|raw| {
            if raw.is_cancelled() {
                return Observed::Dropped {
                    id: raw.id.clone(),
                    reason: DropReason::Cancelled,
                };
            }
            if !raw.is_attending() {
                return Observed::Dropped {
                    id: raw.id.clone(),
                    reason: DropReason::Declined,
                };
            }
            match Event::from_raw(raw, &list.default_reminders, &timings) {
                Ok(event) => Observed::Active(event),
                Err(e) => {
                    warn!("Skipping event {} ({:?}): {}", raw.id, raw.summary, e);
                    Observed::Invalid { id: raw.id.clone() }
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::google_calendar::models::{
        EventDateTime, RawAttendee, RawReminders,
    };

    fn at(value: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(value).unwrap()
    }

    fn event(reminders: Vec<Reminder>) -> Event {
        Event {
            id: "e1".to_string(),
            summary: "my meeting".to_string(),
            description: "this is my meeting".to_string(),
            start: at("2022-05-12T12:00:00Z"),
            end: at("2022-05-12T12:30:00Z"),
            conference_link: None,
            html_link: None,
            location: String::new(),
            reminders,
        }
    }

    fn raw(id: &str) -> RawEvent {
        RawEvent {
            id: id.to_string(),
            status: "confirmed".to_string(),
            summary: "Planning".to_string(),
            start: EventDateTime {
                date_time: Some("2022-05-12T12:00:00Z".to_string()),
                ..Default::default()
            },
            end: EventDateTime {
                date_time: Some("2022-05-12T13:00:00Z".to_string()),
                ..Default::default()
            },
            reminders: RawReminders {
                use_default: true,
                overrides: Vec::new(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_event_comparison_ignores_fired_state() {
        let fired = event(vec![
            Reminder {
                lead: Duration::hours(1),
                fired: true,
                handle: Some(7),
            },
            Reminder::new(Duration::minutes(1)),
        ]);
        let mut fresh = event(vec![
            Reminder::new(Duration::hours(1)),
            Reminder::new(Duration::minutes(1)),
        ]);
        assert!(fired.same_content(&fresh));

        fresh.start = at("2022-05-12T12:15:00Z");
        assert!(!fired.same_content(&fresh));
    }

    #[test]
    fn test_reminder_lists_must_match() {
        let a = event(vec![Reminder::new(Duration::minutes(10))]);
        let b = event(vec![Reminder::new(Duration::minutes(5))]);
        let c = event(vec![]);
        assert!(!a.same_content(&b));
        assert!(!a.same_content(&c));
    }

    #[test]
    fn test_reminder_due_boundary() {
        let start = at("2022-05-12T12:00:00Z");
        let reminder = Reminder::new(Duration::minutes(10));
        let utc = |s: &str| at(s).with_timezone(&Utc);

        assert!(!reminder.is_due(&start, &utc("2022-05-12T11:49:59Z")));
        assert!(reminder.is_due(&start, &utc("2022-05-12T11:50:00Z")));
        assert!(reminder.is_due(&start, &utc("2022-05-12T12:10:00Z")));

        let fired = Reminder {
            fired: true,
            ..reminder
        };
        assert!(!fired.is_due(&start, &utc("2022-05-12T11:55:00Z")));
    }

    #[test]
    fn test_notification_contents() {
        let mut e = event(vec![]);
        let request = e.notification(Some(&chrono_tz::UTC));
        assert_eq!(request.title, "12:00 | my meeting");
        assert_eq!(request.body, "this is my meeting");
        assert_eq!(request.icon, IconHint::Calendar);
        assert_eq!(request.actions[0].key, DEFAULT_ACTION);
        assert_eq!(e.preferred_link(), None);

        e.html_link = Some("https://calendar.example/e1".to_string());
        assert_eq!(e.preferred_link(), Some("https://calendar.example/e1"));

        e.conference_link = Some("https://meet.example/abc".to_string());
        assert_eq!(e.notification(None).icon, IconHint::VideoCall);
        assert_eq!(e.preferred_link(), Some("https://meet.example/abc"));
    }

    #[test]
    fn test_title_uses_calendar_offset_by_default() {
        let mut e = event(vec![]);
        e.start = at("2030-01-07T12:00:00+03:00");
        e.end = at("2030-01-07T12:30:00+03:00");
        e.summary = "Standup".to_string();

        assert_eq!(e.notification(None).title, "12:00 | Standup");
        assert_eq!(
            e.notification(Some(&chrono_tz::UTC)).title,
            "09:00 | Standup"
        );
    }

    #[test]
    fn test_huge_reminder_lead_is_invalid() {
        let mut huge = raw("huge");
        huge.reminders = RawReminders {
            use_default: false,
            overrides: vec![RawReminder {
                method: "popup".to_string(),
                minutes: i64::MAX,
            }],
        };
        let list = EventList {
            items: vec![huge, raw("ok")],
            ..Default::default()
        };

        let observed = observe(&list);
        assert_eq!(observed[0], Observed::Invalid { id: "huge".to_string() });
        assert!(matches!(observed[1], Observed::Active(_)));
    }

    #[test]
    fn test_lead_beyond_time_range_is_due() {
        let start = at("2022-05-12T12:00:00Z");
        let reminder = Reminder::new(Duration::MAX);
        assert!(reminder.is_due(&start, &Utc::now()));
    }

    #[test]
    fn test_observe_classifies_records() {
        let mut cancelled = raw("cancelled");
        cancelled.status = "cancelled".to_string();

        let mut declined = raw("declined");
        declined.attendees = vec![RawAttendee {
            email: "me@example.com".to_string(),
            is_self: true,
            response_status: "declined".to_string(),
        }];

        let mut broken = raw("broken");
        broken.start.date_time = Some("tomorrow".to_string());

        let mut backwards = raw("backwards");
        backwards.end.date_time = Some("2022-05-12T11:00:00Z".to_string());

        let list = EventList {
            items: vec![raw("ok"), cancelled, declined, broken, backwards],
            default_reminders: vec![RawReminder {
                method: "popup".to_string(),
                minutes: 10,
            }],
            next_page_token: None,
        };

        let observed = observe(&list);
        assert_eq!(observed.len(), 5);
        match &observed[0] {
            Observed::Active(event) => {
                assert_eq!(event.reminders, vec![Reminder::new(Duration::minutes(10))]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            observed[1],
            Observed::Dropped {
                id: "cancelled".to_string(),
                reason: DropReason::Cancelled
            }
        );
        assert_eq!(
            observed[2],
            Observed::Dropped {
                id: "declined".to_string(),
                reason: DropReason::Declined
            }
        );
        assert_eq!(observed[3], Observed::Invalid { id: "broken".to_string() });
        assert_eq!(observed[4].id(), "backwards");
        assert!(matches!(observed[4], Observed::Invalid { .. }));
    }
}
