//! Booking admission and the booking lifecycle.
//!
//! Every capacity rule is enforced by a single guarded repository call, so
//! two concurrent requests can never both pass the same check:
//!
//! - creation goes through `insert_booking_guarded` (duplicate + quota)
//! - check-in goes through `check_in_guarded` (date + status + occupancy)
//! - other moves go through `transition_booking` (compare-and-set)

use chrono::{NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::api::codes;
use crate::db::repository::{
    BookingInsertOutcome, CheckInOutcome, FullRepository, RepositoryError, TransitionOutcome,
};
use crate::models::{Booking, BookingId, BookingStatus, EmployeeId, NewBooking, SessionId};

/// Domain failures of the booking lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("Employee {employee_id} is not an active employee")]
    EmployeeNotFound { employee_id: String },

    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    #[error("Bookings are only accepted from {earliest} to {latest}")]
    OutsideBookingWindow {
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    #[error("Employee is already registered for this session (booking {booking_id})")]
    AlreadyRegistered { booking_id: BookingId },

    #[error("Session is full (quota {quota})")]
    SlotFull { quota: i32 },

    #[error("Booking {0} not found")]
    BookingNotFound(BookingId),

    #[error("Booking is dated {booking_date}, check-in is only possible on that day")]
    NotToday { booking_date: NaiveDate },

    #[error("Cannot change booking status from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// The display text is the `GYM_FULL` sentinel clients match on.
    #[error("GYM_FULL")]
    GymFull { current: i64, max: i32 },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AdmissionError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmployeeNotFound { .. }
            | Self::SessionNotFound(_)
            | Self::BookingNotFound(_) => codes::NOT_FOUND,
            Self::OutsideBookingWindow { .. } => codes::OUTSIDE_BOOKING_WINDOW,
            Self::AlreadyRegistered { .. } => codes::ALREADY_REGISTERED,
            Self::SlotFull { .. } => codes::SLOT_FULL,
            Self::NotToday { .. } => codes::NOT_TODAY,
            Self::InvalidTransition { .. } => codes::INVALID_TRANSITION,
            Self::GymFull { .. } => codes::GYM_FULL,
            Self::Repository(e) if e.is_not_found() => codes::NOT_FOUND,
            Self::Repository(RepositoryError::ValidationError { .. }) => codes::BAD_REQUEST,
            Self::Repository(RepositoryError::Conflict { .. }) => codes::CONFLICT,
            Self::Repository(_) => codes::INTERNAL_ERROR,
        }
    }
}

pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// A booking request as submitted by a client. The employee id is still raw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub employee_id: String,
    pub session_id: SessionId,
    pub booking_date: NaiveDate,
}

/// Reserve a slot for an employee.
///
/// # Errors
/// * `EmployeeNotFound` - Unparseable id, unknown or inactive employee
/// * `SessionNotFound` - Unknown session
/// * `OutsideBookingWindow` - Date outside `[today + min, today + max]`
/// * `AlreadyRegistered` - Same employee already booked on that date at the session's start time
/// * `SlotFull` - The session already holds `quota` bookings for that date
pub async fn create_booking<R: FullRepository + ?Sized>(
    repo: &R,
    request: &BookingRequest,
    today: NaiveDate,
) -> AdmissionResult<Booking> {
    let not_found = || AdmissionError::EmployeeNotFound {
        employee_id: request.employee_id.trim().to_string(),
    };
    let employee_id = EmployeeId::parse(&request.employee_id).map_err(|_| not_found())?;
    repo.get_employee(&employee_id)
        .await?
        .filter(|e| e.active)
        .ok_or_else(not_found)?;

    let session = match repo.get_session(request.session_id).await {
        Ok(session) => session,
        Err(e) if e.is_not_found() => {
            return Err(AdmissionError::SessionNotFound(request.session_id))
        }
        Err(e) => return Err(e.into()),
    };

    let settings = repo.get_gym_settings().await?;
    if !settings.allows_booking_on(request.booking_date, today) {
        let (earliest, latest) = settings.booking_window(today);
        return Err(AdmissionError::OutsideBookingWindow { earliest, latest });
    }

    let new = NewBooking {
        employee_id,
        session_id: session.id,
        booking_date: request.booking_date,
    };
    match repo
        .insert_booking_guarded(&new, session.quota, Utc::now())
        .await?
    {
        BookingInsertOutcome::Created(booking) => {
            info!(
                "Booking {} created: employee {} in '{}' on {}",
                booking.id, booking.employee_id, session.session_name, booking.booking_date
            );
            Ok(booking)
        }
        BookingInsertOutcome::Duplicate(existing) => {
            warn!(
                "Employee {} already holds booking {} for session {} on {}",
                existing.employee_id, existing.id, existing.session_id, existing.booking_date
            );
            Err(AdmissionError::AlreadyRegistered {
                booking_id: existing.id,
            })
        }
        BookingInsertOutcome::SlotFull { held } => {
            warn!(
                "Session {} on {} is full ({}/{})",
                session.id, new.booking_date, held, session.quota
            );
            Err(AdmissionError::SlotFull {
                quota: session.quota,
            })
        }
    }
}

/// Admit an employee into the gym.
///
/// The occupancy limit is read from the settings store on every call.
pub async fn check_in<R: FullRepository + ?Sized>(
    repo: &R,
    booking_id: BookingId,
    today: NaiveDate,
) -> AdmissionResult<Booking> {
    let max = repo.get_gym_settings().await?.max_occupancy;
    match repo
        .check_in_guarded(booking_id, today, max, Utc::now())
        .await?
    {
        CheckInOutcome::CheckedIn(booking) => {
            info!("Booking {} checked in ({})", booking.id, booking.employee_id);
            Ok(booking)
        }
        CheckInOutcome::GymFull { current } => {
            warn!(
                "Check-in of booking {} refused: gym full ({}/{})",
                booking_id, current, max
            );
            Err(AdmissionError::GymFull { current, max })
        }
        CheckInOutcome::NotToday(booking) => Err(AdmissionError::NotToday {
            booking_date: booking.booking_date,
        }),
        CheckInOutcome::Rejected(booking) => Err(AdmissionError::InvalidTransition {
            from: booking.status,
            to: BookingStatus::CheckIn,
        }),
        CheckInOutcome::NotFound => Err(AdmissionError::BookingNotFound(booking_id)),
    }
}

async fn transition<R: FullRepository + ?Sized>(
    repo: &R,
    booking_id: BookingId,
    from: BookingStatus,
    to: BookingStatus,
) -> AdmissionResult<Booking> {
    match repo
        .transition_booking(booking_id, from, to, Utc::now())
        .await?
    {
        TransitionOutcome::Applied(booking) => {
            info!("Booking {} moved {} -> {}", booking.id, from, to);
            Ok(booking)
        }
        TransitionOutcome::Rejected(current) => Err(AdmissionError::InvalidTransition {
            from: current.status,
            to,
        }),
        TransitionOutcome::NotFound => Err(AdmissionError::BookingNotFound(booking_id)),
    }
}

/// `CHECKIN -> COMPLETED`.
pub async fn check_out<R: FullRepository + ?Sized>(
    repo: &R,
    booking_id: BookingId,
) -> AdmissionResult<Booking> {
    transition(
        repo,
        booking_id,
        BookingStatus::CheckIn,
        BookingStatus::Completed,
    )
    .await
}

/// `BOOKED -> CANCELLED`.
pub async fn cancel<R: FullRepository + ?Sized>(
    repo: &R,
    booking_id: BookingId,
) -> AdmissionResult<Booking> {
    transition(
        repo,
        booking_id,
        BookingStatus::Booked,
        BookingStatus::Cancelled,
    )
    .await
}

/// Move a booking to `status`, dispatching to the matching lifecycle step.
///
/// `BOOKED` and `EXPIRED` are never valid targets here.
pub async fn update_status<R: FullRepository + ?Sized>(
    repo: &R,
    booking_id: BookingId,
    status: BookingStatus,
    today: NaiveDate,
) -> AdmissionResult<Booking> {
    match status {
        BookingStatus::CheckIn => check_in(repo, booking_id, today).await,
        BookingStatus::Completed => check_out(repo, booking_id).await,
        BookingStatus::Cancelled => cancel(repo, booking_id).await,
        BookingStatus::Booked | BookingStatus::Expired => {
            let current = match repo.get_booking(booking_id).await {
                Ok(booking) => booking,
                Err(e) if e.is_not_found() => {
                    return Err(AdmissionError::BookingNotFound(booking_id))
                }
                Err(e) => return Err(e.into()),
            };
            Err(AdmissionError::InvalidTransition {
                from: current.status,
                to: status,
            })
        }
    }
}

/// Expire every `BOOKED` booking dated before `today`.
pub async fn expire_stale<R: FullRepository + ?Sized>(
    repo: &R,
    today: NaiveDate,
) -> AdmissionResult<usize> {
    let expired = repo.expire_bookings_before(today, Utc::now()).await?;
    if expired > 0 {
        info!("Expired {} bookings dated before {}", expired, today);
    }
    Ok(expired)
}

/// Hard-delete a booking in any state.
pub async fn delete_booking<R: FullRepository + ?Sized>(
    repo: &R,
    booking_id: BookingId,
) -> AdmissionResult<()> {
    if repo.delete_booking(booking_id).await? {
        info!("Deleted booking {}", booking_id);
        Ok(())
    } else {
        Err(AdmissionError::BookingNotFound(booking_id))
    }
}
