//! Data Transfer Objects for the HTTP API.
//!
//! Successful responses are wrapped in [`Envelope`], which flattens the body
//! next to `"ok": true`. Request extractors reject malformed input with the
//! same failure envelope as every other error.

use axum::extract::{FromRequest, FromRequestParts};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::error::AppError;
use crate::models::{Booking, BookingStatus, Employee, GymSession, GymSettings, SessionId};
use crate::services::{BookingView, DayAvailability, LiveTransaction};

/// `Json` extractor that reports failures as [`AppError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor that reports failures as [`AppError::BadRequest`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `Path` extractor that reports failures as [`AppError::BadRequest`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Success envelope: `{ "ok": true, ...body }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    pub fn ok(body: T) -> Self {
        Self { ok: true, body }
    }
}

/// Accept an id sent either as a JSON string or as a JSON number.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

// ==================== Requests ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub employee_id: String,
    pub session_id: SessionId,
    pub booking_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub booking_id: i64,
    /// Parsed leniently (`CHECK_IN`, `checkout`, ...).
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingListQuery {
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<String>,
    pub session_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeBookingsQuery {
    pub employee_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub start: Option<NaiveDate>,
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeSearchQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

/// Directory upload: either a bare array or `{ "employees": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmployeeUpload {
    Wrapped { employees: Vec<serde_json::Value> },
    Bare(Vec<serde_json::Value>),
}

impl EmployeeUpload {
    pub fn into_records(self) -> Vec<serde_json::Value> {
        match self {
            EmployeeUpload::Wrapped { employees } => employees,
            EmployeeUpload::Bare(records) => records,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

// ==================== Responses ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    pub version: String,
    /// Database connection status
    pub database: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<GymSession>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session: GymSession,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingView>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub booking: Booking,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpireResponse {
    pub expired: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityResponse {
    pub start: NaiveDate,
    pub days: u32,
    pub calendar: Vec<DayAvailability>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeListResponse {
    pub employees: Vec<Employee>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<LiveTransaction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    pub settings: GymSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupportContactResponse {
    pub contact: crate::models::SupportContact,
}

pub fn parse_status(raw: &str) -> Result<BookingStatus, AppError> {
    raw.parse::<BookingStatus>().map_err(AppError::BadRequest)
}
