//! Persistence layer for sessions, bookings, the employee directory and
//! settings.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers / domain services (crate::services)      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs) - logged pass-throughs     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────────┐
//!     │ LocalRepository  │ PostgresRepository │
//!     │  (in-memory)     │  (Diesel + r2d2)   │
//!     └──────────────────────────────────────┘
//! ```
//!
//! # Usage
//! ```
//! use gym_access::db::{services, RepositoryFactory};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let repo = RepositoryFactory::create_local();
//! let sessions = services::list_sessions(repo.as_ref()).await.unwrap();
//! assert!(sessions.is_empty());
//! # });
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    BookingFilter, BookingInsertOutcome, BookingRepository, CheckInOutcome, EmployeeRepository,
    EmployeeSearch, ErrorContext, FullRepository, RepositoryError, RepositoryResult,
    SessionRepository, SettingsRepository, TransitionOutcome,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Initialize the global repository from `repository.toml` or, when no file
/// exists, from the environment. Later calls are no-ops.
pub async fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = RepositoryFactory::from_default_config()
        .await
        .map_err(|e| anyhow::Error::msg(e.to_string()))
        .context("Failed to initialize repository")?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
