//! Gym sessions: named daily time windows with a booking quota.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::time::hhmm;

crate::define_id_type!(i64, SessionId);

const MAX_SESSION_NAME_LEN: usize = 100;

/// A recurring daily time slot that employees can book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GymSession {
    pub id: SessionId,
    pub session_name: String,
    #[serde(with = "hhmm")]
    pub time_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub time_end: NaiveTime,
    /// Maximum BOOKED/CHECKIN reservations for one date.
    pub quota: i32,
}

/// Session attributes as submitted by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGymSession {
    pub session_name: String,
    #[serde(with = "hhmm")]
    pub time_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub time_end: NaiveTime,
    pub quota: i32,
}

impl NewGymSession {
    /// Check field constraints and return a copy with the name trimmed.
    pub fn validate(&self) -> Result<Self, String> {
        let session_name = self.session_name.trim().to_string();
        if session_name.is_empty() {
            return Err("Session name is required".to_string());
        }
        if session_name.chars().count() > MAX_SESSION_NAME_LEN {
            return Err(format!(
                "Session name must be at most {} characters",
                MAX_SESSION_NAME_LEN
            ));
        }
        if self.time_end <= self.time_start {
            return Err("Session end time must be after its start time".to_string());
        }
        if self.quota < 1 {
            return Err("Session quota must be at least 1".to_string());
        }
        Ok(Self {
            session_name,
            ..self.clone()
        })
    }

    pub fn into_session(self, id: SessionId) -> GymSession {
        GymSession {
            id,
            session_name: self.session_name,
            time_start: self.time_start,
            time_end: self.time_end,
            quota: self.quota,
        }
    }
}

impl GymSession {
    /// True when `other` would collide with this session's (name, start) pair.
    pub fn same_slot_as(&self, other: &NewGymSession) -> bool {
        self.time_start == other.time_start
            && self.session_name.eq_ignore_ascii_case(other.session_name.trim())
    }
}
