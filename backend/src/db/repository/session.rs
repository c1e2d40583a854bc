//! Gym session persistence.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{GymSession, NewGymSession, SessionId};

/// Repository trait for gym sessions.
///
/// Sessions are identified by their surrogate [`SessionId`]; the pair
/// (name, start time) must stay unique, and implementations report a
/// violation as `RepositoryError::Conflict`.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// List all sessions ordered by start time, then name.
    async fn list_sessions(&self) -> RepositoryResult<Vec<GymSession>>;

    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the session doesn't exist
    async fn get_session(&self, session_id: SessionId) -> RepositoryResult<GymSession>;

    async fn create_session(&self, session: &NewGymSession) -> RepositoryResult<GymSession>;

    async fn update_session(
        &self,
        session_id: SessionId,
        session: &NewGymSession,
    ) -> RepositoryResult<GymSession>;

    /// Delete a session. Fails with `Conflict` while any booking of the
    /// session still holds a slot (`BOOKED` or `CHECKIN`); other bookings of
    /// the session are removed with it.
    async fn delete_session(&self, session_id: SessionId) -> RepositoryResult<bool>;
}
