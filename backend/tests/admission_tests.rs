//! Tests for the booking lifecycle: admission, capacity guards and transitions.

mod support;

use std::sync::Arc;

use chrono::Utc;
use gym_access::db::repository::{
    BookingRepository, EmployeeRepository, SessionRepository, SettingsRepository,
};
use gym_access::db::LocalRepository;
use gym_access::models::{
    Booking, BookingId, BookingStatus, EmployeeId, GymSettings, NewBooking, SessionId,
};
use gym_access::services::{self, AdmissionError, BookingRequest};
use support::{allow_same_day, day, employee, hm, new_session, seeded_gym, today};

fn request(employee: u32, session_id: SessionId, date: chrono::NaiveDate) -> BookingRequest {
    BookingRequest {
        employee_id: employee.to_string(),
        session_id,
        booking_date: date,
    }
}

fn seeded_booking(employee: u32, session_id: SessionId, date: chrono::NaiveDate) -> Booking {
    NewBooking {
        employee_id: EmployeeId::parse(&employee.to_string()).unwrap(),
        session_id,
        booking_date: date,
    }
    .into_booking(BookingId(0), Utc::now())
}

// =============================================================================
// Creation
// =============================================================================

#[tokio::test]
async fn test_create_booking_for_tomorrow() {
    let gym = seeded_gym(1).await;
    let booking = services::create_booking(
        gym.repo.as_ref(),
        &request(1001, gym.morning.id, day(20)),
        today(),
    )
    .await
    .unwrap();

    assert_eq!(booking.status, BookingStatus::Booked);
    assert_eq!(booking.employee_id.as_str(), "1001");
    assert_eq!(booking.session_id, gym.morning.id);
    assert!(booking.checked_in_at.is_none());
}

#[tokio::test]
async fn test_create_booking_normalizes_employee_id() {
    let gym = seeded_gym(1).await;
    let req = BookingRequest {
        employee_id: "EMP-1001".to_string(),
        session_id: gym.morning.id,
        booking_date: day(21),
    };
    let booking = services::create_booking(gym.repo.as_ref(), &req, today())
        .await
        .unwrap();
    assert_eq!(booking.employee_id.as_str(), "1001");
}

#[tokio::test]
async fn test_create_booking_outside_window() {
    let gym = seeded_gym(1).await;
    for date in [day(18), day(19), day(22)] {
        let err = services::create_booking(
            gym.repo.as_ref(),
            &request(1001, gym.morning.id, date),
            today(),
        )
        .await
        .unwrap_err();
        match err {
            AdmissionError::OutsideBookingWindow { earliest, latest } => {
                assert_eq!(earliest, day(20));
                assert_eq!(latest, day(21));
            }
            other => panic!("expected OutsideBookingWindow for {}, got {:?}", date, other),
        }
    }
}

#[tokio::test]
async fn test_create_booking_unknown_or_inactive_employee() {
    let gym = seeded_gym(1).await;
    let mut retired = employee(2001, "Retired Person", None);
    retired.active = false;
    gym.repo.upsert_employees(&[retired]).await.unwrap();

    for raw in ["9999", "2001", "no-digits"] {
        let req = BookingRequest {
            employee_id: raw.to_string(),
            session_id: gym.morning.id,
            booking_date: day(20),
        };
        let err = services::create_booking(gym.repo.as_ref(), &req, today())
            .await
            .unwrap_err();
        assert!(
            matches!(err, AdmissionError::EmployeeNotFound { .. }),
            "{}: {:?}",
            raw,
            err
        );
        assert_eq!(err.code(), "NOT_FOUND");
    }
    assert_eq!(gym.repo.booking_count(), 0);
}

#[tokio::test]
async fn test_create_booking_unknown_session() {
    let gym = seeded_gym(1).await;
    let err = services::create_booking(
        gym.repo.as_ref(),
        &request(1001, SessionId(404), day(20)),
        today(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AdmissionError::SessionNotFound(SessionId(404))));
}

#[tokio::test]
async fn test_duplicate_booking_is_already_registered() {
    let gym = seeded_gym(1).await;
    let req = request(1001, gym.morning.id, day(20));
    let first = services::create_booking(gym.repo.as_ref(), &req, today())
        .await
        .unwrap();

    let err = services::create_booking(gym.repo.as_ref(), &req, today())
        .await
        .unwrap_err();
    match err {
        AdmissionError::AlreadyRegistered { booking_id } => assert_eq!(booking_id, first.id),
        other => panic!("expected AlreadyRegistered, got {:?}", other),
    }

    // Another session or another day is a different reservation.
    services::create_booking(
        gym.repo.as_ref(),
        &request(1001, gym.evening.id, day(20)),
        today(),
    )
    .await
    .unwrap();
    services::create_booking(
        gym.repo.as_ref(),
        &request(1001, gym.morning.id, day(21)),
        today(),
    )
    .await
    .unwrap();
    assert_eq!(gym.repo.booking_count(), 3);
}

#[tokio::test]
async fn test_same_start_time_in_another_session_is_already_registered() {
    let gym = seeded_gym(2).await;
    let cardio = gym
        .repo
        .create_session(&new_session(
            "Cardio",
            gym.morning.time_start,
            hm(7, 0),
            15,
        ))
        .await
        .unwrap();

    let first = services::create_booking(
        gym.repo.as_ref(),
        &request(1001, gym.morning.id, day(20)),
        today(),
    )
    .await
    .unwrap();
    let err = services::create_booking(
        gym.repo.as_ref(),
        &request(1001, cardio.id, day(20)),
        today(),
    )
    .await
    .unwrap_err();
    match err {
        AdmissionError::AlreadyRegistered { booking_id } => assert_eq!(booking_id, first.id),
        other => panic!("expected AlreadyRegistered, got {:?}", other),
    }

    // Someone else can still take the parallel session.
    services::create_booking(
        gym.repo.as_ref(),
        &request(1002, cardio.id, day(20)),
        today(),
    )
    .await
    .unwrap();

    // Once the first reservation is cancelled the start time is free again.
    services::cancel(gym.repo.as_ref(), first.id).await.unwrap();
    services::create_booking(
        gym.repo.as_ref(),
        &request(1001, cardio.id, day(20)),
        today(),
    )
    .await
    .unwrap();
    assert_eq!(gym.repo.booking_count(), 3);
}

#[tokio::test]
async fn test_sixteenth_booking_gets_slot_full() {
    let gym = seeded_gym(16).await;
    for i in 0..15 {
        services::create_booking(
            gym.repo.as_ref(),
            &request(1001 + i, gym.morning.id, day(20)),
            today(),
        )
        .await
        .unwrap();
    }

    let err = services::create_booking(
        gym.repo.as_ref(),
        &request(1016, gym.morning.id, day(20)),
        today(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AdmissionError::SlotFull { quota: 15 }));
    assert_eq!(err.code(), "SLOT_FULL");

    // The quota is per date and per session.
    services::create_booking(
        gym.repo.as_ref(),
        &request(1016, gym.morning.id, day(21)),
        today(),
    )
    .await
    .unwrap();
    services::create_booking(
        gym.repo.as_ref(),
        &request(1016, gym.evening.id, day(20)),
        today(),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_cancelled_booking_frees_slot_and_allows_rebooking() {
    let gym = seeded_gym(16).await;
    let mut first = None;
    for i in 0..15 {
        let booking = services::create_booking(
            gym.repo.as_ref(),
            &request(1001 + i, gym.morning.id, day(20)),
            today(),
        )
        .await
        .unwrap();
        first.get_or_insert(booking);
    }
    let first = first.unwrap();

    let cancelled = services::cancel(gym.repo.as_ref(), first.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    services::create_booking(
        gym.repo.as_ref(),
        &request(1016, gym.morning.id, day(20)),
        today(),
    )
    .await
    .unwrap();

    // The slot is full again, so the original employee is refused by quota,
    // not by the duplicate rule.
    let err = services::create_booking(
        gym.repo.as_ref(),
        &request(1001, gym.morning.id, day(20)),
        today(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AdmissionError::SlotFull { .. }));
}

#[tokio::test]
async fn test_completed_booking_blocks_rebooking() {
    let gym = seeded_gym(1).await;
    allow_same_day(&gym.repo).await;
    let req = request(1001, gym.morning.id, today());
    let booking = services::create_booking(gym.repo.as_ref(), &req, today())
        .await
        .unwrap();
    services::check_in(gym.repo.as_ref(), booking.id, today())
        .await
        .unwrap();
    services::check_out(gym.repo.as_ref(), booking.id)
        .await
        .unwrap();

    let err = services::create_booking(gym.repo.as_ref(), &req, today())
        .await
        .unwrap_err();
    assert!(matches!(err, AdmissionError::AlreadyRegistered { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_never_exceed_quota() {
    let gym = seeded_gym(40).await;
    let session_id = gym.morning.id;

    let handles: Vec<_> = (0..40)
        .map(|i| {
            let repo = Arc::clone(&gym.repo);
            tokio::spawn(async move {
                services::create_booking(
                    repo.as_ref(),
                    &request(1001 + i, session_id, day(20)),
                    today(),
                )
                .await
            })
        })
        .collect();

    let mut created = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(AdmissionError::SlotFull { .. }) => full += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(created, 15);
    assert_eq!(full, 25);
}

// =============================================================================
// Check-in and occupancy
// =============================================================================

#[tokio::test]
async fn test_check_in_stamps_time() {
    let gym = seeded_gym(1).await;
    allow_same_day(&gym.repo).await;
    let booking = services::create_booking(
        gym.repo.as_ref(),
        &request(1001, gym.morning.id, today()),
        today(),
    )
    .await
    .unwrap();

    let checked = services::check_in(gym.repo.as_ref(), booking.id, today())
        .await
        .unwrap();
    assert_eq!(checked.status, BookingStatus::CheckIn);
    assert!(checked.checked_in_at.is_some());

    let done = services::check_out(gym.repo.as_ref(), booking.id)
        .await
        .unwrap();
    assert_eq!(done.status, BookingStatus::Completed);
    assert!(done.checked_out_at.is_some());
    assert_eq!(done.checked_in_at, checked.checked_in_at);
}

#[tokio::test]
async fn test_check_in_on_wrong_day_is_not_today() {
    let gym = seeded_gym(1).await;
    let booking = services::create_booking(
        gym.repo.as_ref(),
        &request(1001, gym.morning.id, day(20)),
        today(),
    )
    .await
    .unwrap();

    let err = services::check_in(gym.repo.as_ref(), booking.id, today())
        .await
        .unwrap_err();
    match &err {
        AdmissionError::NotToday { booking_date } => assert_eq!(*booking_date, day(20)),
        other => panic!("expected NotToday, got {:?}", other),
    }
    assert_eq!(err.code(), "NOT_TODAY");
}

#[tokio::test]
async fn test_sixteenth_check_in_gets_gym_full() {
    let gym = seeded_gym(16).await;
    allow_same_day(&gym.repo).await;

    // Occupancy spans sessions, so split the crowd over both.
    let mut ids = Vec::new();
    for i in 0..16 {
        let session_id = if i % 2 == 0 {
            gym.morning.id
        } else {
            gym.evening.id
        };
        let booking = services::create_booking(
            gym.repo.as_ref(),
            &request(1001 + i, session_id, today()),
            today(),
        )
        .await
        .unwrap();
        ids.push(booking.id);
    }

    for id in &ids[..15] {
        services::check_in(gym.repo.as_ref(), *id, today())
            .await
            .unwrap();
    }

    let err = services::check_in(gym.repo.as_ref(), ids[15], today())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AdmissionError::GymFull {
            current: 15,
            max: 15
        }
    ));
    assert_eq!(err.to_string(), "GYM_FULL");
    let still_booked = gym.repo.get_booking(ids[15]).await.unwrap();
    assert_eq!(still_booked.status, BookingStatus::Booked);

    // One person leaves, the waiting one gets in.
    services::check_out(gym.repo.as_ref(), ids[0]).await.unwrap();
    services::check_in(gym.repo.as_ref(), ids[15], today())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_occupancy_limit_is_read_from_settings() {
    let gym = seeded_gym(3).await;
    gym.repo
        .save_gym_settings(&GymSettings {
            max_occupancy: 2,
            min_days_ahead: 0,
            max_days_ahead: 2,
        })
        .await
        .unwrap();

    let mut ids = Vec::new();
    for i in 0..3 {
        let booking = services::create_booking(
            gym.repo.as_ref(),
            &request(1001 + i, gym.morning.id, today()),
            today(),
        )
        .await
        .unwrap();
        ids.push(booking.id);
    }
    services::check_in(gym.repo.as_ref(), ids[0], today())
        .await
        .unwrap();
    services::check_in(gym.repo.as_ref(), ids[1], today())
        .await
        .unwrap();
    let err = services::check_in(gym.repo.as_ref(), ids[2], today())
        .await
        .unwrap_err();
    assert!(matches!(err, AdmissionError::GymFull { current: 2, max: 2 }));
}

#[tokio::test]
async fn test_occupancy_ignores_other_days() {
    let gym = seeded_gym(2).await;
    gym.repo
        .save_gym_settings(&GymSettings {
            max_occupancy: 1,
            min_days_ahead: 0,
            max_days_ahead: 2,
        })
        .await
        .unwrap();

    let mut yesterday = seeded_booking(1001, gym.morning.id, day(18));
    yesterday.status = BookingStatus::CheckIn;
    yesterday.checked_in_at = Some(Utc::now());
    gym.repo.insert_booking_unchecked(yesterday);

    let booking = services::create_booking(
        gym.repo.as_ref(),
        &request(1002, gym.morning.id, today()),
        today(),
    )
    .await
    .unwrap();
    services::check_in(gym.repo.as_ref(), booking.id, today())
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_check_ins_never_exceed_occupancy() {
    let repo = Arc::new(LocalRepository::new());
    repo.upsert_employees(&support::staff(30)).await.unwrap();
    let ids: Vec<BookingId> = (0..30)
        .map(|i| {
            repo.insert_booking_unchecked(seeded_booking(1001 + i, SessionId(1), today()))
                .id
        })
        .collect();

    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { services::check_in(repo.as_ref(), id, today()).await })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(AdmissionError::GymFull { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(admitted, 15);
}

// =============================================================================
// Transitions
// =============================================================================

#[tokio::test]
async fn test_backward_transitions_are_rejected() {
    let gym = seeded_gym(1).await;
    allow_same_day(&gym.repo).await;
    let booking = services::create_booking(
        gym.repo.as_ref(),
        &request(1001, gym.morning.id, today()),
        today(),
    )
    .await
    .unwrap();

    // BOOKED cannot skip to COMPLETED.
    let err = services::check_out(gym.repo.as_ref(), booking.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AdmissionError::InvalidTransition {
            from: BookingStatus::Booked,
            to: BookingStatus::Completed
        }
    ));

    services::check_in(gym.repo.as_ref(), booking.id, today())
        .await
        .unwrap();

    // CHECKIN -> BOOKED
    let err = services::update_status(
        gym.repo.as_ref(),
        booking.id,
        BookingStatus::Booked,
        today(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        AdmissionError::InvalidTransition {
            from: BookingStatus::CheckIn,
            to: BookingStatus::Booked
        }
    ));

    // CHECKIN -> CANCELLED
    let err = services::cancel(gym.repo.as_ref(), booking.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION");

    services::check_out(gym.repo.as_ref(), booking.id)
        .await
        .unwrap();

    // COMPLETED -> CHECKIN
    let err = services::check_in(gym.repo.as_ref(), booking.id, today())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AdmissionError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::CheckIn
        }
    ));
}

#[tokio::test]
async fn test_update_status_dispatches() {
    let gym = seeded_gym(2).await;
    allow_same_day(&gym.repo).await;
    let a = services::create_booking(
        gym.repo.as_ref(),
        &request(1001, gym.morning.id, today()),
        today(),
    )
    .await
    .unwrap();
    let b = services::create_booking(
        gym.repo.as_ref(),
        &request(1002, gym.morning.id, day(20)),
        today(),
    )
    .await
    .unwrap();

    let a = services::update_status(gym.repo.as_ref(), a.id, BookingStatus::CheckIn, today())
        .await
        .unwrap();
    assert_eq!(a.status, BookingStatus::CheckIn);
    let a = services::update_status(gym.repo.as_ref(), a.id, BookingStatus::Completed, today())
        .await
        .unwrap();
    assert_eq!(a.status, BookingStatus::Completed);
    let b = services::update_status(gym.repo.as_ref(), b.id, BookingStatus::Cancelled, today())
        .await
        .unwrap();
    assert_eq!(b.status, BookingStatus::Cancelled);

    // EXPIRED is only reachable through the sweep.
    let err = services::update_status(gym.repo.as_ref(), b.id, BookingStatus::Expired, today())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_transitions_on_missing_booking() {
    let repo = LocalRepository::new();
    let missing = BookingId(77);
    let results = [
        services::check_in(&repo, missing, today()).await.unwrap_err(),
        services::check_out(&repo, missing).await.unwrap_err(),
        services::cancel(&repo, missing).await.unwrap_err(),
        services::update_status(&repo, missing, BookingStatus::Booked, today())
            .await
            .unwrap_err(),
        services::delete_booking(&repo, missing).await.unwrap_err(),
    ];
    for err in results {
        assert!(
            matches!(err, AdmissionError::BookingNotFound(BookingId(77))),
            "{:?}",
            err
        );
    }
}

// =============================================================================
// Expiry and deletion
// =============================================================================

#[tokio::test]
async fn test_expire_stale_only_touches_past_booked() {
    let repo = LocalRepository::new();
    let old = repo.insert_booking_unchecked(seeded_booking(1001, SessionId(1), day(17)));
    let yesterday = repo.insert_booking_unchecked(seeded_booking(1002, SessionId(1), day(18)));
    let mut inside = seeded_booking(1003, SessionId(1), day(18));
    inside.status = BookingStatus::CheckIn;
    let inside = repo.insert_booking_unchecked(inside);
    let current = repo.insert_booking_unchecked(seeded_booking(1004, SessionId(1), today()));

    let expired = services::expire_stale(&repo, today()).await.unwrap();
    assert_eq!(expired, 2);

    for id in [old.id, yesterday.id] {
        assert_eq!(
            repo.get_booking(id).await.unwrap().status,
            BookingStatus::Expired
        );
    }
    assert_eq!(
        repo.get_booking(inside.id).await.unwrap().status,
        BookingStatus::CheckIn
    );
    assert_eq!(
        repo.get_booking(current.id).await.unwrap().status,
        BookingStatus::Booked
    );

    assert_eq!(services::expire_stale(&repo, today()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_booking_in_any_state() {
    let repo = LocalRepository::new();
    let mut done = seeded_booking(1001, SessionId(1), day(18));
    done.status = BookingStatus::Completed;
    let done = repo.insert_booking_unchecked(done);

    services::delete_booking(&repo, done.id).await.unwrap();
    assert_eq!(repo.booking_count(), 0);
    let err = services::delete_booking(&repo, done.id).await.unwrap_err();
    assert!(matches!(err, AdmissionError::BookingNotFound(_)));
}

#[tokio::test]
async fn test_unhealthy_store_surfaces_as_internal() {
    let gym = seeded_gym(1).await;
    gym.repo.set_healthy(false);
    let err = services::create_booking(
        gym.repo.as_ref(),
        &request(1001, gym.morning.id, day(20)),
        today(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AdmissionError::Repository(_)));
    assert_eq!(err.code(), "INTERNAL_ERROR");
}

// =============================================================================
// Property: status never moves backwards
// =============================================================================

mod monotonic {
    use super::*;
    use proptest::prelude::*;

    fn rank(status: BookingStatus) -> u8 {
        match status {
            BookingStatus::Booked => 0,
            BookingStatus::CheckIn => 1,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Expired => 2,
        }
    }

    fn target() -> impl Strategy<Value = BookingStatus> {
        prop::sample::select(BookingStatus::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn status_rank_never_decreases(targets in prop::collection::vec(target(), 1..12)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let repo = LocalRepository::new();
                let booking = repo.insert_booking_unchecked(
                    seeded_booking(1001, SessionId(1), today()),
                );
                let mut last = BookingStatus::Booked;
                for status in targets {
                    let result = services::update_status(&repo, booking.id, status, today()).await;
                    let now = repo.get_booking(booking.id).await.unwrap().status;
                    prop_assert!(rank(now) >= rank(last), "{} -> {}", last, now);
                    if last.is_terminal() {
                        prop_assert_eq!(now, last);
                    }
                    match result {
                        Ok(updated) => {
                            prop_assert!(last.can_transition_to(status));
                            prop_assert_eq!(updated.status, status);
                        }
                        Err(_) => prop_assert_eq!(now, last),
                    }
                    last = now;
                }
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
