//! Bookings and their lifecycle.
//!
//! A booking is one employee's reservation for one session on one date.
//! Its status only ever moves forward:
//!
//! ```text
//! BOOKED ──► CHECKIN ──► COMPLETED
//!    │
//!    ├──► CANCELLED
//!    └──► EXPIRED
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::employee::EmployeeId;
use super::session::SessionId;

crate::define_id_type!(i64, BookingId);

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Booked,
    CheckIn,
    Completed,
    Cancelled,
    Expired,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Booked,
        BookingStatus::CheckIn,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "BOOKED",
            BookingStatus::CheckIn => "CHECKIN",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Expired => "EXPIRED",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Booked, CheckIn) | (CheckIn, Completed) | (Booked, Cancelled) | (Booked, Expired)
        )
    }

    /// Counts against the session quota for its date.
    pub fn holds_slot(&self) -> bool {
        matches!(self, BookingStatus::Booked | BookingStatus::CheckIn)
    }

    /// Prevents the same employee from booking the same date and session again.
    pub fn blocks_rebooking(&self) -> bool {
        matches!(
            self,
            BookingStatus::Booked | BookingStatus::CheckIn | BookingStatus::Completed
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Expired
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BOOKED" => Ok(Self::Booked),
            "CHECKIN" | "CHECK_IN" | "CHECKED_IN" => Ok(Self::CheckIn),
            "COMPLETED" | "CHECKOUT" | "CHECK_OUT" => Ok(Self::Completed),
            "CANCELLED" | "CANCELED" => Ok(Self::Cancelled),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

/// A stored booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub employee_id: EmployeeId,
    pub session_id: SessionId,
    pub booking_date: NaiveDate,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Same employee and date as `new`, in any session.
    pub fn same_employee_day_as(&self, new: &NewBooking) -> bool {
        self.employee_id == new.employee_id && self.booking_date == new.booking_date
    }

    /// Same date and session as `new`, regardless of employee.
    pub fn same_slot_as(&self, new: &NewBooking) -> bool {
        self.booking_date == new.booking_date && self.session_id == new.session_id
    }

    /// Apply a status change and stamp the matching timestamps.
    pub(crate) fn apply_status(&mut self, status: BookingStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
        match status {
            BookingStatus::CheckIn => self.checked_in_at = Some(now),
            BookingStatus::Completed => self.checked_out_at = Some(now),
            _ => {}
        }
    }
}

/// A reservation request that passed identifier parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub employee_id: EmployeeId,
    pub session_id: SessionId,
    pub booking_date: NaiveDate,
}

impl NewBooking {
    pub fn into_booking(self, id: BookingId, now: DateTime<Utc>) -> Booking {
        Booking {
            id,
            employee_id: self.employee_id,
            session_id: self.session_id,
            booking_date: self.booking_date,
            status: BookingStatus::Booked,
            created_at: now,
            checked_in_at: None,
            checked_out_at: None,
            updated_at: now,
        }
    }
}
