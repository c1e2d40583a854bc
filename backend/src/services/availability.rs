//! Weekly availability calendar.
//!
//! Pure aggregation over sessions and bookings; the caller fetches both.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::time::{add_days, hhmm};
use crate::models::{Booking, BookingStatus, GymSession, SessionId};

pub const DEFAULT_CALENDAR_DAYS: u32 = 7;
pub const MAX_CALENDAR_DAYS: u32 = 14;

/// Occupancy of one session on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    pub session_id: SessionId,
    pub session_name: String,
    #[serde(with = "hhmm")]
    pub time_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub time_end: NaiveTime,
    pub quota: i32,
    pub booked: i32,
    pub checked_in: i32,
    pub available: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    /// English weekday name, e.g. `Monday`.
    pub weekday: String,
    pub slots: Vec<SlotAvailability>,
}

/// Clamp a requested day count into `1..=14`.
pub fn clamp_days(days: Option<u32>) -> u32 {
    days.unwrap_or(DEFAULT_CALENDAR_DAYS)
        .clamp(1, MAX_CALENDAR_DAYS)
}

/// Build one [`DayAvailability`] per date in `[start, start + days)`.
///
/// Slots follow session start time. Bookings for unknown sessions or for
/// dates outside the range are ignored.
pub fn weekly_calendar(
    sessions: &[GymSession],
    bookings: &[Booking],
    start: NaiveDate,
    days: u32,
) -> Vec<DayAvailability> {
    let days = days.clamp(1, MAX_CALENDAR_DAYS);

    let mut ordered: Vec<&GymSession> = sessions.iter().collect();
    ordered.sort_by(|a, b| {
        a.time_start
            .cmp(&b.time_start)
            .then_with(|| a.session_name.cmp(&b.session_name))
    });

    // (date, session) -> (booked, checked_in)
    let mut counts: HashMap<(NaiveDate, SessionId), (i32, i32)> = HashMap::new();
    for booking in bookings {
        let entry = counts
            .entry((booking.booking_date, booking.session_id))
            .or_default();
        match booking.status {
            BookingStatus::Booked => entry.0 += 1,
            BookingStatus::CheckIn => entry.1 += 1,
            _ => {}
        }
    }

    (0..days)
        .map(|offset| {
            let date = add_days(start, u64::from(offset));
            let slots = ordered
                .iter()
                .map(|session| {
                    let (booked, checked_in) =
                        counts.get(&(date, session.id)).copied().unwrap_or((0, 0));
                    SlotAvailability {
                        session_id: session.id,
                        session_name: session.session_name.clone(),
                        time_start: session.time_start,
                        time_end: session.time_end,
                        quota: session.quota,
                        booked,
                        checked_in,
                        available: (session.quota - booked - checked_in).max(0),
                    }
                })
                .collect();
            DayAvailability {
                date,
                weekday: date.format("%A").to_string(),
                slots,
            }
        })
        .collect()
}
