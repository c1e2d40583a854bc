//! Live occupancy view: who is inside the gym right now.
//!
//! Occupancy is never stored. It is the number of bookings dated today that
//! are in `CHECKIN`, recomputed from the store on every poll.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::directory::{enrich_bookings, BookingView};
use crate::db::repository::{BookingFilter, FullRepository, RepositoryResult};
use crate::models::{BookingId, BookingStatus, EmployeeId};

pub const DEFAULT_TRANSACTION_LIMIT: usize = 50;
pub const MAX_TRANSACTION_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveStatus {
    pub date: NaiveDate,
    pub inside: i64,
    pub max_occupancy: i32,
    pub available: i64,
    pub people: Vec<BookingView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    CheckIn,
    CheckOut,
}

impl TransactionKind {
    fn order(self) -> u8 {
        match self {
            TransactionKind::CheckIn => 0,
            TransactionKind::CheckOut => 1,
        }
    }
}

/// One gate event derived from a booking's timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveTransaction {
    pub booking_id: BookingId,
    pub employee_id: EmployeeId,
    pub employee_name: Option<String>,
    pub department: Option<String>,
    pub session_name: Option<String>,
    pub kind: TransactionKind,
    pub at: DateTime<Utc>,
}

/// Current occupancy and the people inside, in check-in order.
pub async fn live_status<R: FullRepository + ?Sized>(
    repo: &R,
    today: NaiveDate,
) -> RepositoryResult<LiveStatus> {
    let settings = repo.get_gym_settings().await?;
    let mut inside = repo
        .list_bookings(&BookingFilter::on_date(today).with_status(BookingStatus::CheckIn))
        .await?;
    inside.sort_by_key(|b| (b.checked_in_at, b.id));

    let count = inside.len() as i64;
    let people = enrich_bookings(repo, inside).await?;
    Ok(LiveStatus {
        date: today,
        inside: count,
        max_occupancy: settings.max_occupancy,
        available: (i64::from(settings.max_occupancy) - count).max(0),
        people,
    })
}

/// Today's check-in and check-out events, newest first.
pub async fn live_transactions<R: FullRepository + ?Sized>(
    repo: &R,
    today: NaiveDate,
    limit: Option<usize>,
) -> RepositoryResult<Vec<LiveTransaction>> {
    let limit = limit
        .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
        .clamp(1, MAX_TRANSACTION_LIMIT);
    let bookings = repo.list_bookings(&BookingFilter::on_date(today)).await?;
    let views = enrich_bookings(repo, bookings).await?;

    let mut events: Vec<LiveTransaction> = Vec::new();
    for view in &views {
        let stamps = [
            (TransactionKind::CheckIn, view.checked_in_at),
            (TransactionKind::CheckOut, view.checked_out_at),
        ];
        for (kind, at) in stamps {
            if let Some(at) = at {
                events.push(LiveTransaction {
                    booking_id: view.booking_id,
                    employee_id: view.employee_id.clone(),
                    employee_name: view.employee_name.clone(),
                    department: view.department.clone(),
                    session_name: view.session_name.clone(),
                    kind,
                    at,
                });
            }
        }
    }

    // Ties keep check-out ahead of the check-in it closes.
    events.sort_by(|a, b| {
        b.at.cmp(&a.at)
            .then_with(|| b.booking_id.cmp(&a.booking_id))
            .then_with(|| b.kind.order().cmp(&a.kind.order()))
    });
    events.truncate(limit);
    Ok(events)
}
