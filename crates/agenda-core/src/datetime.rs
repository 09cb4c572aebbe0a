//! Parsing of user-entered dates and times, and their display forms.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::error::{CoreError, Result};

/// Storage format of [`crate::ScheduledItem::date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Storage format of [`crate::ScheduledItem::time`].
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Accepts `today`, `tomorrow` or `DD/MM/YYYY`, relative to `today`.
pub fn parse_date_input(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    match input.trim() {
        "today" => Ok(today),
        "tomorrow" => Ok(today + Duration::days(1)),
        other => NaiveDate::parse_from_str(other, "%d/%m/%Y")
            .map_err(|_| CoreError::InvalidDate(other.to_string())),
    }
}

/// Accepts `HH:MM:SS` or `HH:MM` (seconds default to zero).
pub fn parse_time_input(input: &str) -> Result<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .map_err(|_| CoreError::InvalidTime(input.to_string()))
}

/// Resolve a local wall-clock date and time to an instant in `tz`.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant;
/// nonexistent ones (DST spring-forward) are an error.
pub fn combine_datetime<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Tz>> {
    let naive = NaiveDateTime::new(date, time);
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| CoreError::InvalidTime(format!("{naive} does not exist locally")))
}

/// `HH:MM:SS` → `hh:MM AM`. Anything unparseable is returned unchanged.
pub fn format_time_for_display(time: &str) -> String {
    NaiveTime::parse_from_str(time, TIME_FORMAT)
        .map(|t| t.format("%I:%M %p").to_string())
        .unwrap_or_else(|_| time.to_string())
}

/// `YYYY-MM-DD` → `Tuesday, July 15, 2025`. Anything unparseable is returned unchanged.
pub fn format_date_for_display(date: &str) -> String {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map(|d| d.format("%A, %B %d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}
