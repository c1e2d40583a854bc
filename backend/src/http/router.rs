//! Router configuration for the HTTP API.
//!
//! Every route is served twice: under `/api` and at the bare path.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Sessions
        .route(
            "/gym-sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/gym-sessions/{id}",
            put(handlers::update_session).delete(handlers::delete_session),
        )
        // Bookings
        .route("/gym-bookings", get(handlers::list_bookings))
        .route("/gym-booking-create", post(handlers::create_booking))
        .route("/gym-booking-status", post(handlers::update_booking_status))
        .route("/gym-booking/{id}", delete(handlers::delete_booking))
        .route("/gym-bookings-expire", post(handlers::expire_bookings))
        .route(
            "/gym-bookings-by-employee",
            get(handlers::bookings_by_employee),
        )
        .route("/gym-availability", get(handlers::get_availability))
        // Directory
        .route(
            "/employee-core",
            get(handlers::search_employees).post(handlers::upsert_employees),
        )
        // Live views
        .route("/gym-live-status", get(handlers::live_status))
        .route("/gym-live-transactions", get(handlers::live_transactions))
        // Settings
        .route(
            "/gym-controller-settings",
            get(handlers::get_gym_settings).post(handlers::save_gym_settings),
        )
        .route(
            "/app-settings/support-contact",
            get(handlers::get_support_contact).post(handlers::save_support_contact),
        )
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS; the front end is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes())
        .merge(routes())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
