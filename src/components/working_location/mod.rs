mod slack;

pub use slack::SlackClient;

use crate::components::google_calendar::time::parse_date;
use crate::components::google_calendar::{CalendarSource, EventQuery, RawEvent};
use crate::components::Component;
use crate::config::components::WORKING_LOCATION;
use crate::error::{validation_error, DaemonResult, Error};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Where the user works today, as pushed to the status sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingLocation {
    Home,
    Office,
}

impl WorkingLocation {
    /// Map a calendar working location type
    pub fn from_kind(kind: &str) -> DaemonResult<Self> {
        match kind {
            "homeOffice" => Ok(WorkingLocation::Home),
            "officeLocation" => Ok(WorkingLocation::Office),
            other => Err(validation_error(&format!(
                "Unsupported working location: {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for WorkingLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkingLocation::Home => write!(f, "home"),
            WorkingLocation::Office => write!(f, "office"),
        }
    }
}

/// External status the working location is mirrored to
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn set_status(&self, location: WorkingLocation) -> DaemonResult<()>;
}

/// Whether an all-day entry covers `today` (end date exclusive)
fn covers(event: &RawEvent, today: NaiveDate) -> DaemonResult<bool> {
    let start = parse_date(&event.start)?;
    let end = parse_date(&event.end)?;
    Ok(start <= today && today < end)
}

/// Pushes today's working location to the status sink
pub struct LocationMatcher {
    source: Arc<dyn CalendarSource>,
    status: Arc<dyn StatusSink>,
    poll_interval: std::time::Duration,
}

impl LocationMatcher {
    pub fn new(
        source: Arc<dyn CalendarSource>,
        status: Arc<dyn StatusSink>,
        poll_interval: std::time::Duration,
    ) -> Self {
        Self {
            source,
            status,
            poll_interval,
        }
    }

    /// Look up today's working location and push it.
    ///
    /// Returns the pushed location, or `None` when no entry applies. Only the
    /// first applicable entry is considered.
    pub async fn poll_once<Z: TimeZone>(
        &self,
        now: DateTime<Z>,
    ) -> DaemonResult<Option<WorkingLocation>> {
        let now_utc = now.with_timezone(&Utc);
        let today = now.date_naive();
        let query = EventQuery::working_location(now_utc, now_utc + Duration::hours(24));
        let list = self.source.list_events(query).await?;

        for event in &list.items {
            match covers(event, today) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(
                        "Ignoring working location [start={:?} end={:?}]: {:?}",
                        event.start.date, event.end.date, event.working_location_properties
                    );
                    continue;
                }
                Err(e) => {
                    error!("Skipping working location {}: {}", event.id, e);
                    continue;
                }
            }

            let kind = event
                .working_location_properties
                .as_ref()
                .map(|p| p.kind.as_str())
                .unwrap_or_default();
            let location = WorkingLocation::from_kind(kind)?;
            debug!("Setting working location: {}", location);
            self.status.set_status(location).await?;
            return Ok(Some(location));
        }

        Ok(None)
    }
}

#[async_trait]
impl Component for LocationMatcher {
    fn name(&self) -> &'static str {
        WORKING_LOCATION
    }

    async fn run(&self, shutdown: CancellationToken) -> DaemonResult<()> {
        info!("Checking working location every {:?}", self.poll_interval);
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Err(Error::Cancelled),
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = shutdown.cancelled() => return Err(Error::Cancelled),
                result = self.poll_once(Local::now()) => match result {
                    Ok(Some(location)) => info!("Working location set to {}", location),
                    Ok(None) => debug!("No working location for today"),
                    Err(e) => error!("Failed to set working location: {}", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::google_calendar::models::EventDateTime;

    fn all_day(start: &str, end: &str) -> RawEvent {
        RawEvent {
            id: "wl".to_string(),
            start: EventDateTime {
                date: Some(start.to_string()),
                ..Default::default()
            },
            end: EventDateTime {
                date: Some(end.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            WorkingLocation::from_kind("homeOffice").unwrap(),
            WorkingLocation::Home
        );
        assert_eq!(
            WorkingLocation::from_kind("officeLocation").unwrap(),
            WorkingLocation::Office
        );
        assert!(matches!(
            WorkingLocation::from_kind("customLocation"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_covers_uses_exclusive_end() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap();
        assert!(covers(&all_day("2024-05-14", "2024-05-15"), today).unwrap());
        assert!(covers(&all_day("2024-05-13", "2024-05-16"), today).unwrap());
        assert!(!covers(&all_day("2024-05-15", "2024-05-16"), today).unwrap());
        assert!(!covers(&all_day("2024-05-13", "2024-05-14"), today).unwrap());
        assert!(covers(&RawEvent::default(), today).is_err());
    }
}
