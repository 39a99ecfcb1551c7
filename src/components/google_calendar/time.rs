use super::models::{EventDateTime, RawEvent};
use crate::error::{validation_error, DaemonResult};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use std::collections::HashMap;

/// Parse the `dateTime` part of an event time (RFC 3339 with offset)
pub fn parse_date_time(time: &EventDateTime) -> DaemonResult<DateTime<FixedOffset>> {
    let value = time
        .date_time
        .as_deref()
        .ok_or_else(|| validation_error(&format!("Missing dateTime in {:?}", time)))?;
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| validation_error(&format!("Failed to parse datetime '{}': {}", value, e)))
}

/// Parse the date-only part of an all-day event time
pub fn parse_date(time: &EventDateTime) -> DaemonResult<NaiveDate> {
    let value = time
        .date
        .as_deref()
        .ok_or_else(|| validation_error(&format!("Missing date in {:?}", time)))?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| validation_error(&format!("Failed to parse date '{}': {}", value, e)))
}

/// Timing observed on a fully specified occurrence of a recurring series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeriesTiming {
    /// end - start
    duration: Duration,
    /// scheduled start - original start
    shift: Duration,
}

/// Per-series timings collected from one fetch batch, used to complete
/// rescheduled instances that arrive without a direct start or end.
#[derive(Debug, Default)]
pub struct SeriesTimings {
    by_series: HashMap<String, SeriesTiming>,
}

impl SeriesTimings {
    /// Collect timings from every occurrence that carries start, end and original start
    pub fn from_events(events: &[RawEvent]) -> Self {
        let mut by_series = HashMap::new();
        for event in events {
            let Some(series) = event.recurring_event_id.as_ref() else {
                continue;
            };
            if by_series.contains_key(series) {
                continue;
            }
            let (Ok(start), Ok(end)) = (parse_date_time(&event.start), parse_date_time(&event.end))
            else {
                continue;
            };
            let shift = event
                .original_start_time
                .as_ref()
                .and_then(|original| parse_date_time(original).ok())
                .map(|original| start - original)
                .unwrap_or_else(Duration::zero);
            by_series.insert(
                series.clone(),
                SeriesTiming {
                    duration: end - start,
                    shift,
                },
            );
        }
        Self { by_series }
    }

    /// Effective start and end of a timed event.
    ///
    /// Events with both times use them directly. A rescheduled instance
    /// missing one of them borrows the duration and shift of its series.
    pub fn resolve(
        &self,
        event: &RawEvent,
    ) -> DaemonResult<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let start = parse_date_time(&event.start);
        let end = parse_date_time(&event.end);
        let original = match &event.original_start_time {
            Some(original) if start.is_err() || end.is_err() => parse_date_time(original)?,
            // Not a rescheduled instance, report whatever was wrong
            _ => return Ok((start?, end?)),
        };
        let timing = event
            .recurring_event_id
            .as_ref()
            .and_then(|series| self.by_series.get(series))
            .ok_or_else(|| {
                validation_error(&format!(
                    "Event {} has incomplete times and no measurable series occurrence",
                    event.id
                ))
            })?;

        let start = start.unwrap_or(original + timing.shift);
        let end = end.unwrap_or(start + timing.duration);
        Ok((start, end))
    }
}
