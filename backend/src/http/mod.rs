//! HTTP server module.
//!
//! An axum-based REST API over the service layer and the repository traits.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Request parsing and validation                         │
//! │  - { ok, ... } envelopes and error codes                  │
//! │  - CORS, compression, tracing                             │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Service Layer (crate::services, crate::db::services)     │
//! │  - Booking admission and lifecycle                        │
//! │  - Availability, directory, live views                    │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Repository Layer (crate::db)                             │
//! │  - LocalRepository / PostgresRepository                   │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{ApiError, AppError};
pub use router::create_router;
pub use state::AppState;
