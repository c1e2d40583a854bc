//! Wall-clock helpers shared by the session and booking models.
//!
//! Session windows are daily clock times without a date, bookings carry a
//! calendar date. Both travel over the wire as plain strings: `HH:MM` for
//! clock times and `YYYY-MM-DD` for dates.

use chrono::{Days, NaiveDate, NaiveTime};

const CLOCK_FORMAT: &str = "%H:%M";

/// Parse a clock time in `HH:MM` or `HH:MM:SS` form.
pub fn parse_clock_time(raw: &str) -> Result<NaiveTime, String> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, CLOCK_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| format!("Invalid time '{}', expected HH:MM", raw))
}

/// Format a clock time as `HH:MM`.
pub fn format_clock_time(time: NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

/// `date + days`, saturating at the calendar's upper bound.
pub fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Serde adapter for `NaiveTime` as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_clock_time(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_clock_time(&raw).map_err(serde::de::Error::custom)
    }
}
