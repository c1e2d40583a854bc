use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use super::schema::{app_settings, gym_bookings, gym_employees, gym_sessions, gym_settings};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{
    Booking, BookingId, BookingStatus, Employee, EmployeeId, GymSession, GymSettings,
    NewGymSession, SessionId,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = gym_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // created_at is only used by the database
pub struct SessionRow {
    pub session_id: i64,
    pub session_name: String,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub quota: i32,
    pub created_at: DateTime<Utc>,
}

impl From<SessionRow> for GymSession {
    fn from(row: SessionRow) -> Self {
        GymSession {
            id: SessionId(row.session_id),
            session_name: row.session_name,
            time_start: row.time_start,
            time_end: row.time_end,
            quota: row.quota,
        }
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = gym_sessions)]
pub struct NewSessionRow {
    pub session_name: String,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub quota: i32,
}

impl From<&NewGymSession> for NewSessionRow {
    fn from(session: &NewGymSession) -> Self {
        NewSessionRow {
            session_name: session.session_name.trim().to_string(),
            time_start: session.time_start,
            time_end: session.time_end,
            quota: session.quota,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = gym_bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookingRow {
    pub booking_id: i64,
    pub employee_id: String,
    pub session_id: i64,
    pub booking_date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> RepositoryResult<Self> {
        let status: BookingStatus = row.status.parse().map_err(|e: String| {
            RepositoryError::internal(format!("Booking {}: {}", row.booking_id, e))
        })?;
        let employee_id = EmployeeId::parse(&row.employee_id).map_err(|e| {
            RepositoryError::internal(format!("Booking {}: {}", row.booking_id, e))
        })?;
        Ok(Booking {
            id: BookingId(row.booking_id),
            employee_id,
            session_id: SessionId(row.session_id),
            booking_date: row.booking_date,
            status,
            created_at: row.created_at,
            checked_in_at: row.checked_in_at,
            checked_out_at: row.checked_out_at,
            updated_at: row.updated_at,
        })
    }
}

pub fn rows_to_bookings(rows: Vec<BookingRow>) -> RepositoryResult<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = gym_bookings)]
pub struct NewBookingRow {
    pub employee_id: String,
    pub session_id: i64,
    pub booking_date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, QueryableByName, Insertable)]
#[diesel(table_name = gym_employees)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmployeeRow {
    pub employee_id: String,
    pub name: String,
    pub department: Option<String>,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl EmployeeRow {
    pub fn from_employee(employee: &Employee, now: DateTime<Utc>) -> Self {
        EmployeeRow {
            employee_id: employee.employee_id.as_str().to_string(),
            name: employee.name.clone(),
            department: employee.department.clone(),
            active: employee.active,
            updated_at: now,
        }
    }
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = RepositoryError;

    fn try_from(row: EmployeeRow) -> RepositoryResult<Self> {
        let employee_id = EmployeeId::parse(&row.employee_id)
            .map_err(|e| RepositoryError::internal(format!("Directory row: {}", e)))?;
        Ok(Employee {
            employee_id,
            name: row.name,
            department: row.department,
            active: row.active,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = gym_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GymSettingsRow {
    pub id: i32,
    pub max_occupancy: i32,
    pub min_days_ahead: i32,
    pub max_days_ahead: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<GymSettingsRow> for GymSettings {
    fn from(row: GymSettingsRow) -> Self {
        GymSettings {
            max_occupancy: row.max_occupancy,
            min_days_ahead: row.min_days_ahead,
            max_days_ahead: row.max_days_ahead,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = app_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AppSettingRow {
    pub setting_key: String,
    pub setting_value: Value,
    pub updated_at: DateTime<Utc>,
}
