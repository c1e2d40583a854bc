//! Repository-agnostic persistence services.
//!
//! These functions wrap the repository traits with input validation and
//! logging so the rules stay identical across storage backends. Booking
//! admission lives in [`crate::services::admission`]; this module covers the
//! administrative data around it (sessions and settings).
//!
//! # Usage
//!
//! ```no_run
//! use gym_access::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let settings = services::get_gym_settings(&repo).await?;
//!     println!("Max occupancy: {}", settings.max_occupancy);
//!     Ok(())
//! }
//! ```

use log::{info, warn};

use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::models::{GymSession, GymSettings, NewGymSession, SessionId, SupportContact};

// ==================== Health ====================

/// Check that the backing store is reachable.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Sessions ====================

pub async fn list_sessions<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<GymSession>> {
    repo.list_sessions().await
}

pub async fn get_session<R: FullRepository + ?Sized>(
    repo: &R,
    session_id: SessionId,
) -> RepositoryResult<GymSession> {
    repo.get_session(session_id).await
}

/// Validate and store a new session.
///
/// # Returns
/// * `Err(RepositoryError::ValidationError)` - Empty name, inverted times or zero quota
/// * `Err(RepositoryError::Conflict)` - A session with the same name and start exists
pub async fn create_session<R: FullRepository + ?Sized>(
    repo: &R,
    session: &NewGymSession,
) -> RepositoryResult<GymSession> {
    let session = session.validate().map_err(RepositoryError::validation)?;
    let created = repo.create_session(&session).await?;
    info!(
        "Created session {} '{}' {}-{} (quota {})",
        created.id,
        created.session_name,
        created.time_start.format("%H:%M"),
        created.time_end.format("%H:%M"),
        created.quota
    );
    Ok(created)
}

/// Validate and replace an existing session.
///
/// Lowering the quota below the number of bookings already holding the slot
/// is allowed; existing bookings are kept and new ones are refused until the
/// count drops.
pub async fn update_session<R: FullRepository + ?Sized>(
    repo: &R,
    session_id: SessionId,
    session: &NewGymSession,
) -> RepositoryResult<GymSession> {
    let session = session.validate().map_err(RepositoryError::validation)?;
    let updated = repo.update_session(session_id, &session).await?;
    info!("Updated session {} '{}'", updated.id, updated.session_name);
    Ok(updated)
}

/// Delete a session.
///
/// # Returns
/// * `Err(RepositoryError::NotFound)` - If the session doesn't exist
/// * `Err(RepositoryError::Conflict)` - While bookings still hold a slot
pub async fn delete_session<R: FullRepository + ?Sized>(
    repo: &R,
    session_id: SessionId,
) -> RepositoryResult<()> {
    match repo.delete_session(session_id).await {
        Ok(true) => {
            info!("Deleted session {}", session_id);
            Ok(())
        }
        Ok(false) => Err(RepositoryError::not_found(format!(
            "Session {} not found",
            session_id
        ))),
        Err(e) => {
            warn!("Refused to delete session {}: {}", session_id, e);
            Err(e)
        }
    }
}

// ==================== Settings ====================

pub async fn get_gym_settings<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<GymSettings> {
    repo.get_gym_settings().await
}

/// Validate and persist gym settings.
pub async fn save_gym_settings<R: FullRepository + ?Sized>(
    repo: &R,
    settings: &GymSettings,
) -> RepositoryResult<GymSettings> {
    settings.validate().map_err(RepositoryError::validation)?;
    let saved = repo.save_gym_settings(settings).await?;
    info!(
        "Gym settings updated: max_occupancy={}, window=+{}..+{} days",
        saved.max_occupancy, saved.min_days_ahead, saved.max_days_ahead
    );
    Ok(saved)
}

pub async fn get_support_contact<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<SupportContact> {
    repo.get_support_contact().await
}

/// Persist the support contact with every field trimmed.
pub async fn save_support_contact<R: FullRepository + ?Sized>(
    repo: &R,
    contact: &SupportContact,
) -> RepositoryResult<SupportContact> {
    let contact = contact.normalized();
    if let Some(email) = contact.email.as_deref() {
        if !email.contains('@') {
            return Err(RepositoryError::validation(format!(
                "Invalid support email: {}",
                email
            )));
        }
    }
    repo.save_support_contact(&contact).await
}
