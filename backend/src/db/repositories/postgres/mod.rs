//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//! - Guarded admission writes serialized with row locks
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
//!
//! ## Locking
//!
//! A booking insert locks every session row starting at the same time as its
//! session, so concurrent inserts into one slot queue up behind each other and
//! an employee cannot hold two sessions at the same start time.
//! A check-in locks the single `gym_settings` row, which serializes every
//! check-in against the global occupancy count.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    BookingFilter, BookingInsertOutcome, BookingRepository, CheckInOutcome, EmployeeRepository,
    EmployeeSearch, ErrorContext, RepositoryError, RepositoryResult, SessionRepository,
    SettingsRepository, TransitionOutcome,
};
use crate::models::{
    Booking, BookingId, BookingStatus, Employee, EmployeeId, GymSession, GymSettings,
    NewBooking, NewGymSession, SessionId, SupportContact,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

const SETTINGS_ROW_ID: i32 = 1;
const SUPPORT_CONTACT_KEY: &str = "support_contact";

const SLOT_HOLDING: [&str; 2] = ["BOOKED", "CHECKIN"];
const REBOOKING_BLOCKERS: [&str; 3] = ["BOOKED", "CHECKIN", "COMPLETED"];

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self { pool, config })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// The operation is retried up to `max_retries` times when it fails with a
    /// retryable error (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    log::debug!("Retrying database operation (attempt {})", attempt + 1);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = checkout_timeout(e.to_string(), attempt);
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

/// `Pool::get` only fails once `connection_timeout` passes without a free connection.
fn checkout_timeout(message: String, attempt: u32) -> RepositoryError {
    RepositoryError::timeout_with_context(
        message,
        ErrorContext::new("get_connection").with_details(format!("attempt={}", attempt + 1)),
    )
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn find_booking_row(
    conn: &mut PgConnection,
    booking_id: i64,
) -> RepositoryResult<Option<BookingRow>> {
    gym_bookings::table
        .filter(gym_bookings::booking_id.eq(booking_id))
        .select(BookingRow::as_select())
        .first::<BookingRow>(conn)
        .optional()
        .map_err(map_diesel_error)
}

/// Compare-and-set on the booking status, stamping the matching timestamp.
fn update_status_if(
    conn: &mut PgConnection,
    booking_id: i64,
    from: BookingStatus,
    to: BookingStatus,
    now: DateTime<Utc>,
) -> RepositoryResult<Option<BookingRow>> {
    let target = gym_bookings::table
        .filter(gym_bookings::booking_id.eq(booking_id))
        .filter(gym_bookings::status.eq(from.as_str()));
    let status = gym_bookings::status.eq(to.as_str());
    let updated_at = gym_bookings::updated_at.eq(now);

    let result = match to {
        BookingStatus::CheckIn => diesel::update(target)
            .set((status, updated_at, gym_bookings::checked_in_at.eq(Some(now))))
            .returning(BookingRow::as_returning())
            .get_result::<BookingRow>(conn),
        BookingStatus::Completed => diesel::update(target)
            .set((status, updated_at, gym_bookings::checked_out_at.eq(Some(now))))
            .returning(BookingRow::as_returning())
            .get_result::<BookingRow>(conn),
        _ => diesel::update(target)
            .set((status, updated_at))
            .returning(BookingRow::as_returning())
            .get_result::<BookingRow>(conn),
    };
    result.optional().map_err(map_diesel_error)
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl BookingRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_booking_guarded(
        &self,
        new: &NewBooking,
        quota: i32,
        now: DateTime<Utc>,
    ) -> RepositoryResult<BookingInsertOutcome> {
        let new = new.clone();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let session_id = new.session_id.value();
                let not_found = || {
                    RepositoryError::not_found_with_context(
                        format!("Session {} not found", session_id),
                        ErrorContext::new("insert_booking_guarded").with_entity("session"),
                    )
                };
                let Some(time_start) = gym_sessions::table
                    .filter(gym_sessions::session_id.eq(session_id))
                    .select(gym_sessions::time_start)
                    .first::<NaiveTime>(tx)
                    .optional()?
                else {
                    return Err(not_found());
                };

                // Lock every session sharing the start time, in id order, so
                // inserts for one employee into any of them serialize.
                let locked = gym_sessions::table
                    .filter(gym_sessions::time_start.eq(time_start))
                    .order(gym_sessions::session_id)
                    .select(gym_sessions::session_id)
                    .for_update()
                    .load::<i64>(tx)?;
                if !locked.contains(&session_id) {
                    return Err(not_found());
                }

                let existing = gym_bookings::table
                    .inner_join(gym_sessions::table)
                    .filter(gym_bookings::employee_id.eq(new.employee_id.as_str()))
                    .filter(gym_bookings::booking_date.eq(new.booking_date))
                    .filter(gym_sessions::time_start.eq(time_start))
                    .filter(gym_bookings::status.eq_any(REBOOKING_BLOCKERS))
                    .select(BookingRow::as_select())
                    .first::<BookingRow>(tx)
                    .optional()?;
                if let Some(row) = existing {
                    return Ok(BookingInsertOutcome::Duplicate(Booking::try_from(row)?));
                }

                let held: i64 = gym_bookings::table
                    .filter(gym_bookings::booking_date.eq(new.booking_date))
                    .filter(gym_bookings::session_id.eq(session_id))
                    .filter(gym_bookings::status.eq_any(SLOT_HOLDING))
                    .count()
                    .get_result(tx)?;
                if held >= i64::from(quota) {
                    return Ok(BookingInsertOutcome::SlotFull { held });
                }

                let row = diesel::insert_into(gym_bookings::table)
                    .values(&NewBookingRow {
                        employee_id: new.employee_id.as_str().to_string(),
                        session_id,
                        booking_date: new.booking_date,
                        status: BookingStatus::Booked.as_str().to_string(),
                        created_at: now,
                        updated_at: now,
                    })
                    .returning(BookingRow::as_returning())
                    .get_result::<BookingRow>(tx)?;
                Ok(BookingInsertOutcome::Created(Booking::try_from(row)?))
            })
        })
        .await
    }

    async fn check_in_guarded(
        &self,
        booking_id: BookingId,
        today: NaiveDate,
        max_occupancy: i32,
        now: DateTime<Utc>,
    ) -> RepositoryResult<CheckInOutcome> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                gym_settings::table
                    .filter(gym_settings::id.eq(SETTINGS_ROW_ID))
                    .select(gym_settings::id)
                    .for_update()
                    .first::<i32>(tx)
                    .optional()?;

                let Some(row) = find_booking_row(tx, booking_id.value())? else {
                    return Ok(CheckInOutcome::NotFound);
                };
                let booking = Booking::try_from(row)?;
                if booking.booking_date != today {
                    return Ok(CheckInOutcome::NotToday(booking));
                }
                if booking.status != BookingStatus::Booked {
                    return Ok(CheckInOutcome::Rejected(booking));
                }

                let current: i64 = gym_bookings::table
                    .filter(gym_bookings::booking_date.eq(today))
                    .filter(gym_bookings::status.eq(BookingStatus::CheckIn.as_str()))
                    .count()
                    .get_result(tx)?;
                if current >= i64::from(max_occupancy) {
                    return Ok(CheckInOutcome::GymFull { current });
                }

                match update_status_if(
                    tx,
                    booking_id.value(),
                    BookingStatus::Booked,
                    BookingStatus::CheckIn,
                    now,
                )? {
                    Some(updated) => Ok(CheckInOutcome::CheckedIn(Booking::try_from(updated)?)),
                    None => match find_booking_row(tx, booking_id.value())? {
                        Some(row) => Ok(CheckInOutcome::Rejected(Booking::try_from(row)?)),
                        None => Ok(CheckInOutcome::NotFound),
                    },
                }
            })
        })
        .await
    }

    async fn transition_booking(
        &self,
        booking_id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        now: DateTime<Utc>,
    ) -> RepositoryResult<TransitionOutcome> {
        self.with_conn(move |conn| {
            if let Some(updated) = update_status_if(conn, booking_id.value(), from, to, now)? {
                return Ok(TransitionOutcome::Applied(Booking::try_from(updated)?));
            }
            match find_booking_row(conn, booking_id.value())? {
                Some(row) => Ok(TransitionOutcome::Rejected(Booking::try_from(row)?)),
                None => Ok(TransitionOutcome::NotFound),
            }
        })
        .await
    }

    async fn get_booking(&self, booking_id: BookingId) -> RepositoryResult<Booking> {
        self.with_conn(move |conn| {
            let row = find_booking_row(conn, booking_id.value())?.ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("Booking {} not found", booking_id),
                    ErrorContext::new("get_booking")
                        .with_entity("booking")
                        .with_entity_id(booking_id),
                )
            })?;
            Booking::try_from(row)
        })
        .await
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> RepositoryResult<Vec<Booking>> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let mut query = gym_bookings::table.into_boxed();
            if let Some(date) = filter.date {
                query = query.filter(gym_bookings::booking_date.eq(date));
            }
            if let Some(from) = filter.from {
                query = query.filter(gym_bookings::booking_date.ge(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(gym_bookings::booking_date.le(to));
            }
            if let Some(status) = filter.status {
                query = query.filter(gym_bookings::status.eq(status.as_str()));
            }
            if let Some(session_id) = filter.session_id {
                query = query.filter(gym_bookings::session_id.eq(session_id.value()));
            }
            if let Some(employee_id) = filter.employee_id.as_ref() {
                query = query.filter(gym_bookings::employee_id.eq(employee_id.as_str().to_string()));
            }

            let rows = query
                .order((gym_bookings::booking_date.asc(), gym_bookings::booking_id.asc()))
                .select(BookingRow::as_select())
                .load::<BookingRow>(conn)
                .map_err(map_diesel_error)?;
            rows_to_bookings(rows)
        })
        .await
    }

    async fn delete_booking(&self, booking_id: BookingId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                gym_bookings::table.filter(gym_bookings::booking_id.eq(booking_id.value())),
            )
            .execute(conn)
            .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn expire_bookings_before(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        self.with_conn(move |conn| {
            diesel::update(
                gym_bookings::table
                    .filter(gym_bookings::status.eq(BookingStatus::Booked.as_str()))
                    .filter(gym_bookings::booking_date.lt(date)),
            )
            .set((
                gym_bookings::status.eq(BookingStatus::Expired.as_str()),
                gym_bookings::updated_at.eq(now),
            ))
            .execute(conn)
            .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl SessionRepository for PostgresRepository {
    async fn list_sessions(&self) -> RepositoryResult<Vec<GymSession>> {
        self.with_conn(|conn| {
            let rows = gym_sessions::table
                .order((gym_sessions::time_start.asc(), gym_sessions::session_name.asc()))
                .select(SessionRow::as_select())
                .load::<SessionRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(GymSession::from).collect())
        })
        .await
    }

    async fn get_session(&self, session_id: SessionId) -> RepositoryResult<GymSession> {
        self.with_conn(move |conn| {
            gym_sessions::table
                .filter(gym_sessions::session_id.eq(session_id.value()))
                .select(SessionRow::as_select())
                .first::<SessionRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(GymSession::from)
                .ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        format!("Session {} not found", session_id),
                        ErrorContext::new("get_session")
                            .with_entity("session")
                            .with_entity_id(session_id),
                    )
                })
        })
        .await
    }

    async fn create_session(&self, session: &NewGymSession) -> RepositoryResult<GymSession> {
        let row = NewSessionRow::from(session);
        self.with_conn(move |conn| {
            diesel::insert_into(gym_sessions::table)
                .values(&row)
                .returning(SessionRow::as_returning())
                .get_result::<SessionRow>(conn)
                .map(GymSession::from)
                .map_err(|e| map_diesel_error(e).with_operation("create_session"))
        })
        .await
    }

    async fn update_session(
        &self,
        session_id: SessionId,
        session: &NewGymSession,
    ) -> RepositoryResult<GymSession> {
        let row = NewSessionRow::from(session);
        self.with_conn(move |conn| {
            diesel::update(
                gym_sessions::table.filter(gym_sessions::session_id.eq(session_id.value())),
            )
            .set(&row)
            .returning(SessionRow::as_returning())
            .get_result::<SessionRow>(conn)
            .map(GymSession::from)
            .map_err(|e| map_diesel_error(e).with_operation("update_session"))
        })
        .await
    }

    async fn delete_session(&self, session_id: SessionId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let locked = gym_sessions::table
                    .filter(gym_sessions::session_id.eq(session_id.value()))
                    .select(gym_sessions::session_id)
                    .for_update()
                    .first::<i64>(tx)
                    .optional()?;
                if locked.is_none() {
                    return Ok(false);
                }

                let active: i64 = gym_bookings::table
                    .filter(gym_bookings::session_id.eq(session_id.value()))
                    .filter(gym_bookings::status.eq_any(SLOT_HOLDING))
                    .count()
                    .get_result(tx)?;
                if active > 0 {
                    return Err(RepositoryError::conflict_with_context(
                        format!("Session {} still has {} active bookings", session_id, active),
                        ErrorContext::new("delete_session")
                            .with_entity("session")
                            .with_entity_id(session_id),
                    ));
                }

                let deleted = diesel::delete(
                    gym_sessions::table.filter(gym_sessions::session_id.eq(session_id.value())),
                )
                .execute(tx)?;
                Ok(deleted > 0)
            })
        })
        .await
    }
}

#[async_trait]
impl EmployeeRepository for PostgresRepository {
    async fn upsert_employees(&self, employees: &[Employee]) -> RepositoryResult<usize> {
        let now = Utc::now();
        let rows: Vec<EmployeeRow> = employees
            .iter()
            .map(|e| EmployeeRow::from_employee(e, now))
            .collect();
        self.with_conn(move |conn| {
            let mut written = 0;
            for chunk in rows.chunks(500) {
                written += diesel::insert_into(gym_employees::table)
                    .values(chunk)
                    .on_conflict(gym_employees::employee_id)
                    .do_update()
                    .set((
                        gym_employees::name.eq(excluded(gym_employees::name)),
                        gym_employees::department.eq(excluded(gym_employees::department)),
                        gym_employees::active.eq(excluded(gym_employees::active)),
                        gym_employees::updated_at.eq(excluded(gym_employees::updated_at)),
                    ))
                    .execute(conn)
                    .map_err(map_diesel_error)?;
            }
            Ok(written)
        })
        .await
    }

    async fn get_employee(&self, employee_id: &EmployeeId) -> RepositoryResult<Option<Employee>> {
        let key = employee_id.as_str().to_string();
        self.with_conn(move |conn| {
            gym_employees::table
                .filter(gym_employees::employee_id.eq(key))
                .select(EmployeeRow::as_select())
                .first::<EmployeeRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Employee::try_from)
                .transpose()
        })
        .await
    }

    async fn find_employees(&self, ids: &[EmployeeId]) -> RepositoryResult<Vec<Employee>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();
        self.with_conn(move |conn| {
            gym_employees::table
                .filter(gym_employees::employee_id.eq_any(keys))
                .select(EmployeeRow::as_select())
                .load::<EmployeeRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(Employee::try_from)
                .collect()
        })
        .await
    }

    async fn search_employees(&self, search: &EmployeeSearch) -> RepositoryResult<Vec<Employee>> {
        let pattern = search.text.as_deref().map(escape_like);
        let key = search.employee_id.as_ref().map(|id| id.as_str().to_string());
        let limit = search.limit as i64;
        self.with_conn(move |conn| {
            sql_query(
                "SELECT employee_id, name, department, active, updated_at \
                 FROM gym_employees \
                 WHERE ($1 IS NULL AND $2 IS NULL) \
                    OR name ILIKE $1 OR department ILIKE $1 OR employee_id = $2 \
                 ORDER BY name, employee_id \
                 LIMIT $3",
            )
            .bind::<Nullable<Text>, _>(pattern)
            .bind::<Nullable<Text>, _>(key)
            .bind::<BigInt, _>(limit)
            .load::<EmployeeRow>(conn)
            .map_err(map_diesel_error)?
            .into_iter()
            .map(Employee::try_from)
            .collect()
        })
        .await
    }
}

#[async_trait]
impl SettingsRepository for PostgresRepository {
    async fn get_gym_settings(&self) -> RepositoryResult<GymSettings> {
        self.with_conn(|conn| {
            let row = gym_settings::table
                .filter(gym_settings::id.eq(SETTINGS_ROW_ID))
                .select(GymSettingsRow::as_select())
                .first::<GymSettingsRow>(conn)
                .optional()
                .map_err(map_diesel_error)?;
            Ok(row.map(GymSettings::from).unwrap_or_default())
        })
        .await
    }

    async fn save_gym_settings(&self, settings: &GymSettings) -> RepositoryResult<GymSettings> {
        let row = GymSettingsRow {
            id: SETTINGS_ROW_ID,
            max_occupancy: settings.max_occupancy,
            min_days_ahead: settings.min_days_ahead,
            max_days_ahead: settings.max_days_ahead,
            updated_at: Utc::now(),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(gym_settings::table)
                .values(&row)
                .on_conflict(gym_settings::id)
                .do_update()
                .set(&row)
                .returning(GymSettingsRow::as_returning())
                .get_result::<GymSettingsRow>(conn)
                .map(GymSettings::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_support_contact(&self) -> RepositoryResult<SupportContact> {
        self.with_conn(|conn| {
            let row = app_settings::table
                .filter(app_settings::setting_key.eq(SUPPORT_CONTACT_KEY))
                .select(AppSettingRow::as_select())
                .first::<AppSettingRow>(conn)
                .optional()
                .map_err(map_diesel_error)?;
            match row {
                Some(row) => serde_json::from_value(row.setting_value).map_err(|e| {
                    RepositoryError::internal(format!("Invalid support contact JSON: {}", e))
                }),
                None => Ok(SupportContact::default()),
            }
        })
        .await
    }

    async fn save_support_contact(
        &self,
        contact: &SupportContact,
    ) -> RepositoryResult<SupportContact> {
        let value = serde_json::to_value(contact)
            .map_err(|e| RepositoryError::internal(format!("Serialization error: {}", e)))?;
        let row = AppSettingRow {
            setting_key: SUPPORT_CONTACT_KEY.to_string(),
            setting_value: value,
            updated_at: Utc::now(),
        };
        let saved = contact.clone();
        self.with_conn(move |conn| {
            diesel::insert_into(app_settings::table)
                .values(&row)
                .on_conflict(app_settings::setting_key)
                .do_update()
                .set((
                    app_settings::setting_value.eq(excluded(app_settings::setting_value)),
                    app_settings::updated_at.eq(excluded(app_settings::updated_at)),
                ))
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(saved)
        })
        .await
    }
}
