//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data lives behind a
//! single `RwLock`, so each guarded write runs its check and its mutation
//! under one write guard.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{
    Booking, BookingId, BookingStatus, Employee, EmployeeId, GymSession, GymSettings,
    NewBooking, NewGymSession, SessionId, SupportContact,
};

/// In-memory local repository.
///
/// # Example
/// ```
/// use gym_access::db::repositories::LocalRepository;
/// use gym_access::db::repository::SessionRepository;
///
/// # tokio_test_block(async {
/// let repo = LocalRepository::new();
/// let sessions = repo.list_sessions().await.unwrap();
/// assert!(sessions.is_empty());
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    sessions: BTreeMap<SessionId, GymSession>,
    bookings: BTreeMap<BookingId, Booking>,
    employees: HashMap<EmployeeId, Employee>,
    gym_settings: GymSettings,
    support_contact: SupportContact,

    next_session_id: i64,
    next_booking_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            sessions: BTreeMap::new(),
            bookings: BTreeMap::new(),
            employees: HashMap::new(),
            gym_settings: GymSettings::default(),
            support_contact: SupportContact::default(),
            next_session_id: 1,
            next_booking_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn checked_in_on(&self, date: NaiveDate) -> i64 {
        self.bookings
            .values()
            .filter(|b| b.booking_date == date && b.status == BookingStatus::CheckIn)
            .count() as i64
    }

    fn ensure_healthy(&self) -> RepositoryResult<()> {
        if self.is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection("local repository marked unhealthy"))
        }
    }

    fn ensure_unique_slot(
        &self,
        session: &NewGymSession,
        ignore: Option<SessionId>,
    ) -> RepositoryResult<()> {
        let clash = self
            .sessions
            .values()
            .any(|s| Some(s.id) != ignore && s.same_slot_as(session));
        if clash {
            return Err(RepositoryError::conflict_with_context(
                format!(
                    "A session named '{}' already starts at {}",
                    session.session_name.trim(),
                    crate::models::time::format_clock_time(session.time_start)
                ),
                ErrorContext::new("save_session").with_entity("session"),
            ));
        }
        Ok(())
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository, keeping the health flag.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Store a booking as-is, bypassing every guard.
    ///
    /// Useful to seed fixtures in states the public API cannot reach directly.
    pub fn insert_booking_unchecked(&self, mut booking: Booking) -> Booking {
        let mut data = self.data.write();
        let id = BookingId(data.next_booking_id);
        data.next_booking_id += 1;
        booking.id = id;
        data.bookings.insert(id, booking.clone());
        booking
    }

    /// Get the number of bookings stored.
    pub fn booking_count(&self) -> usize {
        self.data.read().bookings.len()
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_booking_guarded(
        &self,
        new: &NewBooking,
        quota: i32,
        now: DateTime<Utc>,
    ) -> RepositoryResult<BookingInsertOutcome> {
        let mut data = self.data.write();
        data.ensure_healthy()?;

        let Some(time_start) = data.sessions.get(&new.session_id).map(|s| s.time_start) else {
            return Err(RepositoryError::not_found_with_context(
                format!("Session {} not found", new.session_id),
                ErrorContext::new("insert_booking_guarded").with_entity("session"),
            ));
        };

        // A reservation is the employee, the date and the start time, so two
        // sessions sharing a start time cannot both be booked.
        if let Some(existing) = data.bookings.values().find(|b| {
            b.same_employee_day_as(new)
                && b.status.blocks_rebooking()
                && data.sessions.get(&b.session_id).map(|s| s.time_start) == Some(time_start)
        }) {
            return Ok(BookingInsertOutcome::Duplicate(existing.clone()));
        }

        let held = data
            .bookings
            .values()
            .filter(|b| b.same_slot_as(new) && b.status.holds_slot())
            .count() as i64;
        if held >= i64::from(quota) {
            return Ok(BookingInsertOutcome::SlotFull { held });
        }

        let id = BookingId(data.next_booking_id);
        data.next_booking_id += 1;
        let booking = new.clone().into_booking(id, now);
        data.bookings.insert(id, booking.clone());
        Ok(BookingInsertOutcome::Created(booking))
    }

    async fn check_in_guarded(
        &self,
        booking_id: BookingId,
        today: NaiveDate,
        max_occupancy: i32,
        now: DateTime<Utc>,
    ) -> RepositoryResult<CheckInOutcome> {
        let mut data = self.data.write();
        data.ensure_healthy()?;

        let Some(booking) = data.bookings.get(&booking_id).cloned() else {
            return Ok(CheckInOutcome::NotFound);
        };
        if booking.booking_date != today {
            return Ok(CheckInOutcome::NotToday(booking));
        }
        if booking.status != BookingStatus::Booked {
            return Ok(CheckInOutcome::Rejected(booking));
        }

        let current = data.checked_in_on(today);
        if current >= i64::from(max_occupancy) {
            return Ok(CheckInOutcome::GymFull { current });
        }

        let Some(stored) = data.bookings.get_mut(&booking_id) else {
            return Ok(CheckInOutcome::NotFound);
        };
        stored.apply_status(BookingStatus::CheckIn, now);
        Ok(CheckInOutcome::CheckedIn(stored.clone()))
    }

    async fn transition_booking(
        &self,
        booking_id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        now: DateTime<Utc>,
    ) -> RepositoryResult<TransitionOutcome> {
        let mut data = self.data.write();
        data.ensure_healthy()?;

        let Some(stored) = data.bookings.get_mut(&booking_id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if stored.status != from {
            return Ok(TransitionOutcome::Rejected(stored.clone()));
        }
        stored.apply_status(to, now);
        Ok(TransitionOutcome::Applied(stored.clone()))
    }

    async fn get_booking(&self, booking_id: BookingId) -> RepositoryResult<Booking> {
        let data = self.data.read();
        data.ensure_healthy()?;
        data.bookings.get(&booking_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Booking {} not found", booking_id),
                ErrorContext::new("get_booking")
                    .with_entity("booking")
                    .with_entity_id(booking_id),
            )
        })
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> RepositoryResult<Vec<Booking>> {
        let data = self.data.read();
        data.ensure_healthy()?;
        let mut bookings: Vec<Booking> = data
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.booking_date, b.id));
        Ok(bookings)
    }

    async fn delete_booking(&self, booking_id: BookingId) -> RepositoryResult<bool> {
        let mut data = self.data.write();
        data.ensure_healthy()?;
        Ok(data.bookings.remove(&booking_id).is_some())
    }

    async fn expire_bookings_before(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        data.ensure_healthy()?;
        let mut expired = 0;
        for booking in data.bookings.values_mut() {
            if booking.status == BookingStatus::Booked && booking.booking_date < date {
                booking.apply_status(BookingStatus::Expired, now);
                expired += 1;
            }
        }
        Ok(expired)
    }
}

#[async_trait]
impl SessionRepository for LocalRepository {
    async fn list_sessions(&self) -> RepositoryResult<Vec<GymSession>> {
        let data = self.data.read();
        data.ensure_healthy()?;
        let mut sessions: Vec<GymSession> = data.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| {
            a.time_start
                .cmp(&b.time_start)
                .then_with(|| a.session_name.cmp(&b.session_name))
        });
        Ok(sessions)
    }

    async fn get_session(&self, session_id: SessionId) -> RepositoryResult<GymSession> {
        let data = self.data.read();
        data.ensure_healthy()?;
        data.sessions.get(&session_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Session {} not found", session_id),
                ErrorContext::new("get_session")
                    .with_entity("session")
                    .with_entity_id(session_id),
            )
        })
    }

    async fn create_session(&self, session: &NewGymSession) -> RepositoryResult<GymSession> {
        let mut data = self.data.write();
        data.ensure_healthy()?;
        data.ensure_unique_slot(session, None)?;

        let id = SessionId(data.next_session_id);
        data.next_session_id += 1;
        let stored = session.clone().into_session(id);
        data.sessions.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_session(
        &self,
        session_id: SessionId,
        session: &NewGymSession,
    ) -> RepositoryResult<GymSession> {
        let mut data = self.data.write();
        data.ensure_healthy()?;
        if !data.sessions.contains_key(&session_id) {
            return Err(RepositoryError::not_found(format!(
                "Session {} not found",
                session_id
            )));
        }
        data.ensure_unique_slot(session, Some(session_id))?;

        let stored = session.clone().into_session(session_id);
        data.sessions.insert(session_id, stored.clone());
        Ok(stored)
    }

    async fn delete_session(&self, session_id: SessionId) -> RepositoryResult<bool> {
        let mut data = self.data.write();
        data.ensure_healthy()?;
        if !data.sessions.contains_key(&session_id) {
            return Ok(false);
        }

        let active = data
            .bookings
            .values()
            .filter(|b| b.session_id == session_id && b.status.holds_slot())
            .count();
        if active > 0 {
            return Err(RepositoryError::conflict_with_context(
                format!("Session {} still has {} active bookings", session_id, active),
                ErrorContext::new("delete_session")
                    .with_entity("session")
                    .with_entity_id(session_id),
            ));
        }

        data.bookings.retain(|_, b| b.session_id != session_id);
        data.sessions.remove(&session_id);
        Ok(true)
    }
}

#[async_trait]
impl EmployeeRepository for LocalRepository {
    async fn upsert_employees(&self, employees: &[Employee]) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        data.ensure_healthy()?;
        for employee in employees {
            data.employees
                .insert(employee.employee_id.clone(), employee.clone());
        }
        Ok(employees.len())
    }

    async fn get_employee(&self, employee_id: &EmployeeId) -> RepositoryResult<Option<Employee>> {
        let data = self.data.read();
        data.ensure_healthy()?;
        Ok(data.employees.get(employee_id).cloned())
    }

    async fn find_employees(&self, ids: &[EmployeeId]) -> RepositoryResult<Vec<Employee>> {
        let data = self.data.read();
        data.ensure_healthy()?;
        Ok(ids
            .iter()
            .filter_map(|id| data.employees.get(id).cloned())
            .collect())
    }

    async fn search_employees(&self, search: &EmployeeSearch) -> RepositoryResult<Vec<Employee>> {
        let data = self.data.read();
        data.ensure_healthy()?;
        let mut found: Vec<Employee> = data
            .employees
            .values()
            .filter(|e| search.matches(e))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.employee_id.cmp(&b.employee_id))
        });
        found.truncate(search.limit);
        Ok(found)
    }
}

#[async_trait]
impl SettingsRepository for LocalRepository {
    async fn get_gym_settings(&self) -> RepositoryResult<GymSettings> {
        let data = self.data.read();
        data.ensure_healthy()?;
        Ok(data.gym_settings)
    }

    async fn save_gym_settings(&self, settings: &GymSettings) -> RepositoryResult<GymSettings> {
        let mut data = self.data.write();
        data.ensure_healthy()?;
        data.gym_settings = *settings;
        Ok(data.gym_settings)
    }

    async fn get_support_contact(&self) -> RepositoryResult<SupportContact> {
        let data = self.data.read();
        data.ensure_healthy()?;
        Ok(data.support_contact.clone())
    }

    async fn save_support_contact(
        &self,
        contact: &SupportContact,
    ) -> RepositoryResult<SupportContact> {
        let mut data = self.data.write();
        data.ensure_healthy()?;
        data.support_contact = contact.clone();
        Ok(data.support_contact.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn morning(quota: i32) -> NewGymSession {
        NewGymSession {
            session_name: "Morning".to_string(),
            time_start: NaiveTime::from_hms_opt(5, 0, 0).unwrap(),
            time_end: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            quota,
        }
    }

    fn request(employee: &str, session_id: SessionId, date: NaiveDate) -> NewBooking {
        NewBooking {
            employee_id: EmployeeId::parse(employee).unwrap(),
            session_id,
            booking_date: date,
        }
    }

    #[tokio::test]
    async fn test_guarded_insert_rejects_duplicate_then_full() {
        let repo = LocalRepository::new();
        let session = repo.create_session(&morning(2)).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let now = Utc::now();

        let first = repo
            .insert_booking_guarded(&request("1", session.id, date), 2, now)
            .await
            .unwrap();
        assert!(matches!(first, BookingInsertOutcome::Created(_)));

        let dup = repo
            .insert_booking_guarded(&request("1", session.id, date), 2, now)
            .await
            .unwrap();
        assert!(matches!(dup, BookingInsertOutcome::Duplicate(_)));

        repo.insert_booking_guarded(&request("2", session.id, date), 2, now)
            .await
            .unwrap();
        let full = repo
            .insert_booking_guarded(&request("3", session.id, date), 2, now)
            .await
            .unwrap();
        assert_eq!(full, BookingInsertOutcome::SlotFull { held: 2 });
        assert_eq!(repo.booking_count(), 2);
    }

    #[tokio::test]
    async fn test_guarded_insert_rejects_second_session_at_same_start() {
        let repo = LocalRepository::new();
        let early = repo.create_session(&morning(5)).await.unwrap();
        let cardio = repo
            .create_session(&NewGymSession {
                session_name: "Cardio".to_string(),
                ..morning(5)
            })
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let now = Utc::now();

        let first = repo
            .insert_booking_guarded(&request("1", early.id, date), 5, now)
            .await
            .unwrap();
        let BookingInsertOutcome::Created(first) = first else {
            panic!("expected Created, got {first:?}");
        };
        let second = repo
            .insert_booking_guarded(&request("1", cardio.id, date), 5, now)
            .await
            .unwrap();
        assert_eq!(second, BookingInsertOutcome::Duplicate(first));

        // Another day is a different reservation.
        let next_day = date.succ_opt().unwrap();
        let other = repo
            .insert_booking_guarded(&request("1", cardio.id, next_day), 5, now)
            .await
            .unwrap();
        assert!(matches!(other, BookingInsertOutcome::Created(_)));
    }

    #[tokio::test]
    async fn test_guarded_insert_unknown_session_is_not_found() {
        let repo = LocalRepository::new();
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let err = repo
            .insert_booking_guarded(&request("1", SessionId(99), date), 5, Utc::now())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unhealthy_repository_fails_queries() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.list_sessions().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_session_slot_uniqueness() {
        let repo = LocalRepository::new();
        let first = repo.create_session(&morning(5)).await.unwrap();
        let err = repo.create_session(&morning(9)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));

        // Updating a session onto its own slot is fine.
        let updated = repo.update_session(first.id, &morning(9)).await.unwrap();
        assert_eq!(updated.quota, 9);
    }

    #[tokio::test]
    async fn test_clear_resets_ids() {
        let repo = LocalRepository::new();
        repo.create_session(&morning(5)).await.unwrap();
        repo.clear();
        let again = repo.create_session(&morning(5)).await.unwrap();
        assert_eq!(again.id, SessionId(1));
    }
}
