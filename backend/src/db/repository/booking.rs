//! Booking persistence and the guarded admission writes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::error::RepositoryResult;
use crate::models::{Booking, BookingId, BookingStatus, EmployeeId, NewBooking, SessionId};

/// Result of a quota-guarded booking insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingInsertOutcome {
    /// The booking was stored in `BOOKED`.
    Created(Booking),
    /// The employee already holds a booking for the same date and session.
    Duplicate(Booking),
    /// The slot already holds `quota` active bookings.
    SlotFull { held: i64 },
}

/// Result of an occupancy-guarded check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    CheckedIn(Booking),
    /// `current` employees are inside, which is at or above the maximum.
    GymFull { current: i64 },
    /// The booking is for another date.
    NotToday(Booking),
    /// The booking is not in `BOOKED`.
    Rejected(Booking),
    NotFound,
}

/// Result of a compare-and-set status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied(Booking),
    /// The booking was not in the expected state; carries its current value.
    Rejected(Booking),
    NotFound,
}

/// Filter for booking listings. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
    pub session_id: Option<SessionId>,
    pub employee_id: Option<EmployeeId>,
}

impl BookingFilter {
    pub fn on_date(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Default::default()
        }
    }

    pub fn for_employee(employee_id: EmployeeId) -> Self {
        Self {
            employee_id: Some(employee_id),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        self.date.is_none_or(|d| booking.booking_date == d)
            && self.from.is_none_or(|d| booking.booking_date >= d)
            && self.to.is_none_or(|d| booking.booking_date <= d)
            && self.status.is_none_or(|s| booking.status == s)
            && self.session_id.is_none_or(|s| booking.session_id == s)
            && self
                .employee_id
                .as_ref()
                .is_none_or(|e| &booking.employee_id == e)
    }
}

/// Repository trait for bookings.
///
/// The `*_guarded` and `transition_booking` methods must be atomic with
/// respect to each other: the check and the write happen as one unit so
/// concurrent callers cannot both pass the same capacity check.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Check if the underlying store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Insert `new` in `BOOKED` unless the employee already holds the same
    /// reservation or the slot already holds `quota` active bookings.
    async fn insert_booking_guarded(
        &self,
        new: &NewBooking,
        quota: i32,
        now: DateTime<Utc>,
    ) -> RepositoryResult<BookingInsertOutcome>;

    /// Move a `BOOKED` booking dated `today` to `CHECKIN` if fewer than
    /// `max_occupancy` bookings dated `today` are in `CHECKIN`.
    async fn check_in_guarded(
        &self,
        booking_id: BookingId,
        today: NaiveDate,
        max_occupancy: i32,
        now: DateTime<Utc>,
    ) -> RepositoryResult<CheckInOutcome>;

    /// Set the status to `to` only if it is currently `from`.
    async fn transition_booking(
        &self,
        booking_id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        now: DateTime<Utc>,
    ) -> RepositoryResult<TransitionOutcome>;

    /// Fetch one booking.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the booking doesn't exist
    async fn get_booking(&self, booking_id: BookingId) -> RepositoryResult<Booking>;

    /// List bookings ordered by date, then id.
    async fn list_bookings(&self, filter: &BookingFilter) -> RepositoryResult<Vec<Booking>>;

    /// Hard-delete a booking in any state. Returns `false` when absent.
    async fn delete_booking(&self, booking_id: BookingId) -> RepositoryResult<bool>;

    /// Move every `BOOKED` booking dated before `date` to `EXPIRED`.
    async fn expire_bookings_before(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> RepositoryResult<usize>;
}
