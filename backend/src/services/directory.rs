//! Employee directory lookups and booking enrichment.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::db::repository::{
    BookingFilter, EmployeeSearch, FullRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    Booking, BookingId, BookingStatus, Employee, EmployeeId, EmployeeRecord, GymSession,
    SessionId,
};

pub const DEFAULT_SEARCH_LIMIT: usize = 50;
pub const MAX_SEARCH_LIMIT: usize = 200;

/// A booking joined with its employee and session.
///
/// Directory and session fields are `None` when the referenced row is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingView {
    pub booking_id: BookingId,
    pub employee_id: EmployeeId,
    pub session_id: SessionId,
    pub booking_date: NaiveDate,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub employee_name: Option<String>,
    pub department: Option<String>,
    pub session_name: Option<String>,
    #[serde(serialize_with = "serialize_opt_hhmm")]
    pub time_start: Option<NaiveTime>,
    #[serde(serialize_with = "serialize_opt_hhmm")]
    pub time_end: Option<NaiveTime>,
}

fn serialize_opt_hhmm<S: serde::Serializer>(
    time: &Option<NaiveTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match time {
        Some(t) => crate::models::time::hhmm::serialize(t, serializer),
        None => serializer.serialize_none(),
    }
}

impl BookingView {
    fn new(booking: Booking, employee: Option<&Employee>, session: Option<&GymSession>) -> Self {
        Self {
            booking_id: booking.id,
            employee_id: booking.employee_id,
            session_id: booking.session_id,
            booking_date: booking.booking_date,
            status: booking.status,
            created_at: booking.created_at,
            checked_in_at: booking.checked_in_at,
            checked_out_at: booking.checked_out_at,
            updated_at: booking.updated_at,
            employee_name: employee.map(|e| e.name.clone()),
            department: employee.and_then(|e| e.department.clone()),
            session_name: session.map(|s| s.session_name.clone()),
            time_start: session.map(|s| s.time_start),
            time_end: session.map(|s| s.time_end),
        }
    }
}

/// Outcome of a directory feed upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub upserted: usize,
    pub rejected: usize,
    /// One message per rejected record, in input order.
    pub errors: Vec<String>,
}

/// Join bookings with the directory and the sessions, keeping input order.
pub async fn enrich_bookings<R: FullRepository + ?Sized>(
    repo: &R,
    bookings: Vec<Booking>,
) -> RepositoryResult<Vec<BookingView>> {
    if bookings.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<EmployeeId> = bookings.iter().map(|b| b.employee_id.clone()).collect();
    ids.sort();
    ids.dedup();
    let employees: HashMap<EmployeeId, Employee> = repo
        .find_employees(&ids)
        .await?
        .into_iter()
        .map(|e| (e.employee_id.clone(), e))
        .collect();
    let sessions: HashMap<SessionId, GymSession> = repo
        .list_sessions()
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    Ok(bookings
        .into_iter()
        .map(|b| {
            let employee = employees.get(&b.employee_id);
            let session = sessions.get(&b.session_id);
            BookingView::new(b, employee, session)
        })
        .collect())
}

/// Filtered booking listing with directory fields.
pub async fn list_booking_views<R: FullRepository + ?Sized>(
    repo: &R,
    filter: &BookingFilter,
) -> RepositoryResult<Vec<BookingView>> {
    let bookings = repo.list_bookings(filter).await?;
    enrich_bookings(repo, bookings).await
}

/// All bookings of one employee, newest date first.
pub async fn employee_bookings<R: FullRepository + ?Sized>(
    repo: &R,
    raw_employee_id: &str,
) -> RepositoryResult<Vec<BookingView>> {
    let employee_id = EmployeeId::parse(raw_employee_id).map_err(RepositoryError::validation)?;
    let mut bookings = repo
        .list_bookings(&BookingFilter::for_employee(employee_id))
        .await?;
    bookings.sort_by(|a, b| {
        b.booking_date
            .cmp(&a.booking_date)
            .then_with(|| b.id.cmp(&a.id))
    });
    enrich_bookings(repo, bookings).await
}

/// Case-insensitive search on name or department; queries containing
/// digits also match the normalized employee id exactly.
pub async fn search_employees<R: FullRepository + ?Sized>(
    repo: &R,
    query: Option<&str>,
    limit: Option<usize>,
) -> RepositoryResult<Vec<Employee>> {
    let text = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string);
    let employee_id = text.as_deref().and_then(|q| EmployeeId::parse(q).ok());
    let search = EmployeeSearch {
        text,
        employee_id,
        limit: limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT),
    };
    repo.search_employees(&search).await
}

/// Normalize and upsert raw directory records.
///
/// Records that fail to parse or normalize are counted and skipped. A later
/// record with the same normalized id replaces an earlier one.
pub async fn ingest_employees<R: FullRepository + ?Sized>(
    repo: &R,
    records: &[Value],
) -> RepositoryResult<IngestSummary> {
    let mut summary = IngestSummary::default();
    let mut accepted: Vec<Employee> = Vec::with_capacity(records.len());
    let mut index: HashMap<EmployeeId, usize> = HashMap::new();

    for (row, raw) in records.iter().enumerate() {
        let normalized = serde_json::from_value::<EmployeeRecord>(raw.clone())
            .map_err(|e| e.to_string())
            .and_then(|record| record.normalize());
        match normalized {
            Ok(employee) => match index.get(&employee.employee_id) {
                Some(&pos) => accepted[pos] = employee,
                None => {
                    index.insert(employee.employee_id.clone(), accepted.len());
                    accepted.push(employee);
                }
            },
            Err(e) => {
                summary.rejected += 1;
                summary.errors.push(format!("record {}: {}", row, e));
            }
        }
    }

    if !accepted.is_empty() {
        repo.upsert_employees(&accepted).await?;
    }
    summary.upserted = accepted.len();

    if summary.rejected > 0 {
        warn!(
            "Directory ingest rejected {} of {} records",
            summary.rejected,
            records.len()
        );
    }
    info!("Directory ingest upserted {} employees", summary.upserted);
    Ok(summary)
}
