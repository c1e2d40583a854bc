//! HTTP error handling and the failure envelope.
//!
//! Every failure renders as `{ "ok": false, "error": "...", "code": "..." }`.
//! Capacity rejections carry extra fields so clients can show the numbers.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::codes;
use crate::db::repository::RepositoryError;
use crate::services::AdmissionError;

/// Failure envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub ok: bool,
    /// Human-readable message, or the `GYM_FULL` sentinel
    pub error: String,
    /// Error code for programmatic handling
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<NaiveDate>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
            code: code.into(),
            current: None,
            max: None,
            earliest: None,
            latest: None,
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    Repository(RepositoryError),
    Admission(AdmissionError),
}

fn status_for(code: &str) -> StatusCode {
    match code {
        codes::BAD_REQUEST => StatusCode::BAD_REQUEST,
        codes::NOT_FOUND => StatusCode::NOT_FOUND,
        codes::ALREADY_REGISTERED
        | codes::SLOT_FULL
        | codes::INVALID_TRANSITION
        | codes::CONFLICT
        | codes::GYM_FULL => StatusCode::CONFLICT,
        codes::OUTSIDE_BOOKING_WINDOW | codes::NOT_TODAY => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn repository_body(err: &RepositoryError) -> ApiError {
    match err {
        RepositoryError::NotFound { message, .. } => ApiError::new(codes::NOT_FOUND, message),
        RepositoryError::ValidationError { message, .. } => {
            ApiError::new(codes::BAD_REQUEST, message)
        }
        RepositoryError::Conflict { message, .. } => ApiError::new(codes::CONFLICT, message),
        other => ApiError::new(codes::INTERNAL_ERROR, other.message()),
    }
}

impl AppError {
    /// The envelope this error renders as.
    pub fn body(&self) -> ApiError {
        match self {
            AppError::BadRequest(msg) => ApiError::new(codes::BAD_REQUEST, msg),
            AppError::Repository(e) => repository_body(e),
            AppError::Admission(AdmissionError::Repository(e)) => repository_body(e),
            AppError::Admission(e) => {
                let mut body = ApiError::new(e.code(), e.to_string());
                match e {
                    AdmissionError::GymFull { current, max } => {
                        body.current = Some(*current);
                        body.max = Some(i64::from(*max));
                    }
                    AdmissionError::OutsideBookingWindow { earliest, latest } => {
                        body.earliest = Some(*earliest);
                        body.latest = Some(*latest);
                    }
                    _ => {}
                }
                body
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        status_for(&self.body().code)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = self.body();
        let status = status_for(&body.code);
        if status.is_server_error() {
            tracing::error!(code = %body.code, "request failed: {:?}", self);
        } else {
            tracing::debug!(code = %body.code, "request rejected: {}", body.error);
        }

        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<AdmissionError> for AppError {
    fn from(err: AdmissionError) -> Self {
        AppError::Admission(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
