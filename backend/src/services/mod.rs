//! Service layer for the gym domain.
//!
//! Services sit between the HTTP handlers and the repository traits. They
//! implement the booking lifecycle, the availability calendar, directory
//! enrichment and the live occupancy view. Every function that depends on
//! the current date takes `today` explicitly.

pub mod admission;
pub mod availability;
pub mod directory;
pub mod live;

pub use admission::{
    cancel, check_in, check_out, create_booking, delete_booking, expire_stale, update_status,
    AdmissionError, BookingRequest,
};
pub use availability::{weekly_calendar, DayAvailability, SlotAvailability};
pub use directory::{
    employee_bookings, enrich_bookings, ingest_employees, list_booking_views, search_employees,
    BookingView, IngestSummary,
};
pub use live::{live_status, live_transactions, LiveStatus, LiveTransaction, TransactionKind};
