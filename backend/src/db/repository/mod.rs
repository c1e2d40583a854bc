//! Repository traits for abstracting database operations.
//!
//! The traits are split by aggregate so each storage backend implements the
//! same narrow interfaces:
//!
//! - [`BookingRepository`]: bookings and the guarded admission writes
//! - [`SessionRepository`]: gym session CRUD
//! - [`EmployeeRepository`]: the mirrored employee directory
//! - [`SettingsRepository`]: gym controller and application settings
//!
//! [`FullRepository`] bundles all of them and is what the HTTP layer holds.

pub mod booking;
pub mod directory;
pub mod error;
pub mod session;
pub mod settings;

pub use booking::{
    BookingFilter, BookingInsertOutcome, BookingRepository, CheckInOutcome, TransitionOutcome,
};
pub use directory::{EmployeeRepository, EmployeeSearch};
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use session::SessionRepository;
pub use settings::SettingsRepository;

/// Every repository capability the application needs.
pub trait FullRepository:
    BookingRepository + SessionRepository + EmployeeRepository + SettingsRepository
{
}

impl<T> FullRepository for T where
    T: BookingRepository + SessionRepository + EmployeeRepository + SettingsRepository
{
}
