//! Application state for the HTTP server.

use chrono::{Local, NaiveDate};
use std::sync::Arc;

use crate::db::repository::FullRepository;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Fixed business date; `None` uses the server's local date.
    today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            repository,
            today: None,
        }
    }

    /// Pin the business date, e.g. for replaying a day or in tests.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// The date check-ins, booking windows and live views are computed for.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}
