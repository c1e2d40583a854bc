//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use gym_access::db::repository::{EmployeeRepository, SessionRepository, SettingsRepository};
use gym_access::db::LocalRepository;
use gym_access::models::{Employee, EmployeeId, GymSession, GymSettings, NewGymSession};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// The fixed "today" every test runs against (a Monday).
pub fn today() -> NaiveDate {
    day(19)
}

/// A day in October 2026.
pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn employee(id: u32, name: &str, department: Option<&str>) -> Employee {
    Employee {
        employee_id: EmployeeId::parse(&id.to_string()).unwrap(),
        name: name.to_string(),
        department: department.map(str::to_string),
        active: true,
    }
}

/// Employees `1001..1001 + count`, all active, alternating departments.
pub fn staff(count: u32) -> Vec<Employee> {
    (0..count)
        .map(|i| {
            let dept = if i % 2 == 0 { "Operations" } else { "Finance" };
            employee(1001 + i, &format!("Employee {}", 1001 + i), Some(dept))
        })
        .collect()
}

pub fn new_session(name: &str, start: NaiveTime, end: NaiveTime, quota: i32) -> NewGymSession {
    NewGymSession {
        session_name: name.to_string(),
        time_start: start,
        time_end: end,
        quota,
    }
}

/// A seeded repository plus handles to what was seeded.
pub struct Gym {
    pub repo: Arc<LocalRepository>,
    pub morning: GymSession,
    pub evening: GymSession,
}

/// Repository with `staff(employees)`, a morning and an evening session of
/// quota 15, and default settings.
pub async fn seeded_gym(employees: u32) -> Gym {
    let repo = Arc::new(LocalRepository::new());
    repo.upsert_employees(&staff(employees)).await.unwrap();
    let morning = repo
        .create_session(&new_session("Morning", hm(6, 0), hm(7, 30), 15))
        .await
        .unwrap();
    let evening = repo
        .create_session(&new_session("Evening", hm(18, 0), hm(19, 30), 15))
        .await
        .unwrap();
    Gym {
        repo,
        morning,
        evening,
    }
}

/// Allow bookings for today so check-in scenarios can start from the API.
pub async fn allow_same_day(repo: &LocalRepository) {
    repo.save_gym_settings(&GymSettings {
        min_days_ahead: 0,
        ..GymSettings::default()
    })
    .await
    .unwrap();
}

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}
