use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDate, TimeZone};
use chrono_tz::Tz;

/// Format an event start as HH:MM, in `tz` or else in its own offset
pub fn format_clock(time: &DateTime<FixedOffset>, tz: Option<&Tz>) -> String {
    match tz {
        Some(tz) => time.with_timezone(tz).format("%H:%M").to_string(),
        None => time.format("%H:%M").to_string(),
    }
}

/// Start of the day after `now`, in `now`'s timezone
pub fn next_midnight<Z: TimeZone>(now: &DateTime<Z>) -> Option<DateTime<Z>> {
    let tomorrow = now.date_naive().succ_opt()?;
    start_of_day(&now.timezone(), tomorrow)
}

/// First instant of `date` in `tz`, skipping forward over a DST gap at midnight
fn start_of_day<Z: TimeZone>(tz: &Z, date: NaiveDate) -> Option<DateTime<Z>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_clock() {
        let start = DateTime::parse_from_rfc3339("2022-05-12T12:05:00Z").unwrap();
        assert_eq!(format_clock(&start, Some(&chrono_tz::UTC)), "12:05");
        assert_eq!(format_clock(&start, Some(&chrono_tz::Europe::Helsinki)), "15:05");

        let local = DateTime::parse_from_rfc3339("2022-05-12T12:05:00-04:00").unwrap();
        assert_eq!(format_clock(&local, None), "12:05");
    }

    #[test]
    fn test_next_midnight() {
        let now = Utc.with_ymd_and_hms(2023, 1, 31, 22, 15, 0).unwrap();
        let midnight = next_midnight(&now).unwrap();
        assert_eq!(midnight, Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap());

        let helsinki = chrono_tz::Europe::Helsinki
            .with_ymd_and_hms(2023, 6, 1, 23, 59, 0)
            .unwrap();
        let midnight = next_midnight(&helsinki).unwrap();
        assert_eq!(
            midnight.format("%Y-%m-%d %H:%M").to_string(),
            "2023-06-02 00:00"
        );
    }
}
