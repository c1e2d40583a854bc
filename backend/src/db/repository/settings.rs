//! Settings store.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{GymSettings, SupportContact};

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Current gym settings, or the defaults when none were saved.
    async fn get_gym_settings(&self) -> RepositoryResult<GymSettings>;

    async fn save_gym_settings(&self, settings: &GymSettings) -> RepositoryResult<GymSettings>;

    async fn get_support_contact(&self) -> RepositoryResult<SupportContact>;

    async fn save_support_contact(
        &self,
        contact: &SupportContact,
    ) -> RepositoryResult<SupportContact>;
}
