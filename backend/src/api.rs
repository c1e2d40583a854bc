//! Public API surface.
//!
//! Consolidates the types that cross the HTTP boundary so clients and
//! integration tests can import them from one place. All of them derive
//! `Serialize`; request types also derive `Deserialize`.

pub use crate::models::{
    Booking, BookingId, BookingStatus, Employee, EmployeeId, EmployeeRecord, GymSession,
    GymSettings, NewGymSession, SessionId, SupportContact,
};
pub use crate::services::{
    AdmissionError, BookingRequest, BookingView, DayAvailability, IngestSummary, LiveStatus,
    LiveTransaction, SlotAvailability, TransactionKind,
};

/// Error codes carried in the `code` field of failure envelopes.
pub mod codes {
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_REGISTERED: &str = "ALREADY_REGISTERED";
    pub const SLOT_FULL: &str = "SLOT_FULL";
    pub const OUTSIDE_BOOKING_WINDOW: &str = "OUTSIDE_BOOKING_WINDOW";
    pub const NOT_TODAY: &str = "NOT_TODAY";
    pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
    pub const CONFLICT: &str = "CONFLICT";
    pub const GYM_FULL: &str = "GYM_FULL";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}
