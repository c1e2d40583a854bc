//! HTTP handlers for the REST API.
//!
//! Each handler parses its input, delegates to the service layer and wraps
//! the result in the success envelope.

use axum::extract::State;
use axum::Json;

use super::dto::{
    parse_status, ApiJson, ApiPath, ApiQuery, AvailabilityQuery, AvailabilityResponse,
    BookingListQuery, BookingListResponse, BookingResponse, CreateBookingRequest,
    EmployeeBookingsQuery, EmployeeListResponse, EmployeeSearchQuery, EmployeeUpload, Envelope,
    ExpireResponse, HealthResponse, LimitQuery, MessageResponse, SessionListResponse,
    SessionResponse, SettingsResponse, SupportContactResponse, TransactionListResponse,
    UpdateBookingStatusRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::repository::{BookingFilter, BookingRepository, SessionRepository};
use crate::db::services as db_services;
use crate::models::{BookingId, GymSettings, NewGymSession, SessionId, SupportContact};
use crate::services::{self, availability, BookingRequest, IngestSummary, LiveStatus};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<Envelope<T>>, AppError>;

fn ok<T>(body: T) -> HandlerResult<T> {
    Ok(Json(Envelope::ok(body)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let database = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    })
}

// =============================================================================
// Sessions
// =============================================================================

/// GET /gym-sessions
pub async fn list_sessions(State(state): State<AppState>) -> HandlerResult<SessionListResponse> {
    let sessions = db_services::list_sessions(state.repository.as_ref()).await?;
    let total = sessions.len();
    ok(SessionListResponse { sessions, total })
}

/// POST /gym-sessions
pub async fn create_session(
    State(state): State<AppState>,
    ApiJson(session): ApiJson<NewGymSession>,
) -> HandlerResult<SessionResponse> {
    let session = db_services::create_session(state.repository.as_ref(), &session).await?;
    ok(SessionResponse { session })
}

/// PUT /gym-sessions/{id}
pub async fn update_session(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<i64>,
    ApiJson(session): ApiJson<NewGymSession>,
) -> HandlerResult<SessionResponse> {
    let session =
        db_services::update_session(state.repository.as_ref(), SessionId(session_id), &session)
            .await?;
    ok(SessionResponse { session })
}

/// DELETE /gym-sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<i64>,
) -> HandlerResult<MessageResponse> {
    db_services::delete_session(state.repository.as_ref(), SessionId(session_id)).await?;
    ok(MessageResponse {
        message: format!("Session {} deleted", session_id),
    })
}

// =============================================================================
// Bookings
// =============================================================================

/// GET /gym-bookings?date=&from=&to=&status=&session_id=
pub async fn list_bookings(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BookingListQuery>,
) -> HandlerResult<BookingListResponse> {
    let filter = BookingFilter {
        date: query.date,
        from: query.from,
        to: query.to,
        status: query.status.as_deref().map(parse_status).transpose()?,
        session_id: query.session_id.map(SessionId),
        employee_id: None,
    };
    let bookings = services::list_booking_views(state.repository.as_ref(), &filter).await?;
    let total = bookings.len();
    ok(BookingListResponse { bookings, total })
}

/// POST /gym-booking-create
pub async fn create_booking(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> HandlerResult<BookingResponse> {
    let request = BookingRequest {
        employee_id: request.employee_id,
        session_id: request.session_id,
        booking_date: request.booking_date,
    };
    let booking =
        services::create_booking(state.repository.as_ref(), &request, state.today()).await?;
    ok(BookingResponse { booking })
}

/// POST /gym-booking-status
pub async fn update_booking_status(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateBookingStatusRequest>,
) -> HandlerResult<BookingResponse> {
    let status = parse_status(&request.status)?;
    let booking = services::update_status(
        state.repository.as_ref(),
        BookingId(request.booking_id),
        status,
        state.today(),
    )
    .await?;
    ok(BookingResponse { booking })
}

/// DELETE /gym-booking/{id}
pub async fn delete_booking(
    State(state): State<AppState>,
    ApiPath(booking_id): ApiPath<i64>,
) -> HandlerResult<MessageResponse> {
    services::delete_booking(state.repository.as_ref(), BookingId(booking_id)).await?;
    ok(MessageResponse {
        message: format!("Booking {} deleted", booking_id),
    })
}

/// POST /gym-bookings-expire
pub async fn expire_bookings(State(state): State<AppState>) -> HandlerResult<ExpireResponse> {
    let expired = services::expire_stale(state.repository.as_ref(), state.today()).await?;
    ok(ExpireResponse { expired })
}

/// GET /gym-bookings-by-employee?employee_id=
pub async fn bookings_by_employee(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EmployeeBookingsQuery>,
) -> HandlerResult<BookingListResponse> {
    let employee_id = query
        .employee_id
        .ok_or_else(|| AppError::BadRequest("employee_id is required".to_string()))?;
    let bookings = services::employee_bookings(state.repository.as_ref(), &employee_id).await?;
    let total = bookings.len();
    ok(BookingListResponse { bookings, total })
}

// =============================================================================
// Availability
// =============================================================================

/// GET /gym-availability?start=&days=
pub async fn get_availability(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> HandlerResult<AvailabilityResponse> {
    let start = query.start.unwrap_or_else(|| state.today());
    let days = availability::clamp_days(query.days);
    let end = crate::models::time::add_days(start, u64::from(days - 1));

    let repo = state.repository.as_ref();
    let sessions = repo.list_sessions().await?;
    let bookings = repo
        .list_bookings(&BookingFilter {
            from: Some(start),
            to: Some(end),
            ..Default::default()
        })
        .await?;

    ok(AvailabilityResponse {
        start,
        days,
        calendar: services::weekly_calendar(&sessions, &bookings, start, days),
    })
}

// =============================================================================
// Employee directory
// =============================================================================

/// GET /employee-core?q=&limit=
pub async fn search_employees(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EmployeeSearchQuery>,
) -> HandlerResult<EmployeeListResponse> {
    let employees =
        services::search_employees(state.repository.as_ref(), query.q.as_deref(), query.limit)
            .await?;
    let total = employees.len();
    ok(EmployeeListResponse { employees, total })
}

/// POST /employee-core
pub async fn upsert_employees(
    State(state): State<AppState>,
    ApiJson(upload): ApiJson<EmployeeUpload>,
) -> HandlerResult<IngestSummary> {
    let records = upload.into_records();
    ok(services::ingest_employees(state.repository.as_ref(), &records).await?)
}

// =============================================================================
// Live views
// =============================================================================

/// GET /gym-live-status
pub async fn live_status(State(state): State<AppState>) -> HandlerResult<LiveStatus> {
    ok(services::live_status(state.repository.as_ref(), state.today()).await?)
}

/// GET /gym-live-transactions?limit=
pub async fn live_transactions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> HandlerResult<TransactionListResponse> {
    let transactions =
        services::live_transactions(state.repository.as_ref(), state.today(), query.limit)
            .await?;
    ok(TransactionListResponse { transactions })
}

// =============================================================================
// Settings
// =============================================================================

/// GET /gym-controller-settings
pub async fn get_gym_settings(State(state): State<AppState>) -> HandlerResult<SettingsResponse> {
    let settings = db_services::get_gym_settings(state.repository.as_ref()).await?;
    ok(SettingsResponse { settings })
}

/// POST /gym-controller-settings
pub async fn save_gym_settings(
    State(state): State<AppState>,
    ApiJson(settings): ApiJson<GymSettings>,
) -> HandlerResult<SettingsResponse> {
    let settings = db_services::save_gym_settings(state.repository.as_ref(), &settings).await?;
    ok(SettingsResponse { settings })
}

/// GET /app-settings/support-contact
pub async fn get_support_contact(
    State(state): State<AppState>,
) -> HandlerResult<SupportContactResponse> {
    let contact = db_services::get_support_contact(state.repository.as_ref()).await?;
    ok(SupportContactResponse { contact })
}

/// POST /app-settings/support-contact
pub async fn save_support_contact(
    State(state): State<AppState>,
    ApiJson(contact): ApiJson<SupportContact>,
) -> HandlerResult<SupportContactResponse> {
    let contact = db_services::save_support_contact(state.repository.as_ref(), &contact).await?;
    ok(SupportContactResponse { contact })
}
