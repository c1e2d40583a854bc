//! Administrator-editable settings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::time::add_days;

pub const DEFAULT_MAX_OCCUPANCY: i32 = 15;
pub const DEFAULT_MIN_DAYS_AHEAD: i32 = 1;
pub const DEFAULT_MAX_DAYS_AHEAD: i32 = 2;
const MAX_BOOKING_HORIZON_DAYS: i32 = 30;

/// Gym controller settings.
///
/// `max_occupancy` bounds how many employees may be checked in at once;
/// the booking window bounds which dates can be reserved relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GymSettings {
    #[serde(default = "default_max_occupancy")]
    pub max_occupancy: i32,
    #[serde(default = "default_min_days_ahead")]
    pub min_days_ahead: i32,
    #[serde(default = "default_max_days_ahead")]
    pub max_days_ahead: i32,
}

fn default_max_occupancy() -> i32 {
    DEFAULT_MAX_OCCUPANCY
}

fn default_min_days_ahead() -> i32 {
    DEFAULT_MIN_DAYS_AHEAD
}

fn default_max_days_ahead() -> i32 {
    DEFAULT_MAX_DAYS_AHEAD
}

impl Default for GymSettings {
    fn default() -> Self {
        Self {
            max_occupancy: DEFAULT_MAX_OCCUPANCY,
            min_days_ahead: DEFAULT_MIN_DAYS_AHEAD,
            max_days_ahead: DEFAULT_MAX_DAYS_AHEAD,
        }
    }
}

impl GymSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_occupancy < 1 {
            return Err("max_occupancy must be at least 1".to_string());
        }
        if self.min_days_ahead < 0 {
            return Err("min_days_ahead cannot be negative".to_string());
        }
        if self.max_days_ahead < self.min_days_ahead {
            return Err("max_days_ahead must not be less than min_days_ahead".to_string());
        }
        if self.max_days_ahead > MAX_BOOKING_HORIZON_DAYS {
            return Err(format!(
                "max_days_ahead must be at most {}",
                MAX_BOOKING_HORIZON_DAYS
            ));
        }
        Ok(())
    }

    /// Inclusive range of bookable dates as seen from `today`.
    pub fn booking_window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let earliest = add_days(today, self.min_days_ahead.max(0) as u64);
        let latest = add_days(today, self.max_days_ahead.max(0) as u64);
        (earliest, latest)
    }

    pub fn allows_booking_on(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let (earliest, latest) = self.booking_window(today);
        (earliest..=latest).contains(&date)
    }
}

/// Contact shown to employees who need help with a booking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl SupportContact {
    /// Trim every field and drop the empty ones.
    pub fn normalized(&self) -> Self {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        Self {
            name: clean(&self.name),
            phone: clean(&self.phone),
            email: clean(&self.email),
        }
    }
}
