//! Integration tests for the notification dispatcher and reminder scanner.
//!
//! Drives the dispatcher against a real queue with a scripted messenger:
//! - Successful delivery marks jobs sent
//! - Transient failures back off exponentially and eventually exhaust
//! - Permanent failures, unusable recipients, and corrupt payloads fail
//!   terminally without retries
//! - Terminal jobs are never claimed or flipped again
//! - The reminder scanner queues day-before and hour-before jobs exactly once

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use selah_core::calendar::EventKind;
use selah_core::capability::Role;
use selah_core::notify::{NotificationKind, NotificationPayload};
use selah_core::types::{DbId, Timestamp};
use selah_db::models::event::{CreateEvent, CreateSlot};
use selah_db::models::musician::CreateMusician;
use selah_db::models::notification_job::NotificationJob;
use selah_db::models::user::CreateUser;
use selah_db::repositories::{
    AssignmentRepo, EventRepo, InstrumentRepo, MusicianRepo, NotificationJobRepo, UserRepo,
};
use selah_notifier::{Dispatcher, Messenger, NotifierConfig, ReminderScanner, SendError};

// ---------------------------------------------------------------------------
// Mock messenger
// ---------------------------------------------------------------------------

/// Scripted messenger that records every delivery attempt. Once the script
/// runs out, further sends succeed.
#[derive(Default)]
struct MockMessenger {
    script: Mutex<VecDeque<Result<(), SendError>>>,
    sent: Mutex<Vec<(String, String, Uuid)>>,
}

impl MockMessenger {
    fn scripted(outcomes: Vec<Result<(), SendError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into()),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, String, Uuid)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(&self, to: &str, body: &str, dedup_key: Uuid) -> Result<(), SendError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string(), dedup_key));
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

fn transient(reason: &str) -> Result<(), SendError> {
    Err(SendError::Transient(reason.to_string()))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_recipient(pool: &PgPool, username: &str, mobile: Option<&str>) -> DbId {
    let user_id = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.ph"),
            nickname: None,
            role: Role::Musician,
        },
    )
    .await
    .expect("create user");
    MusicianRepo::create(
        pool,
        &CreateMusician {
            user_id,
            name: username.to_string(),
            mobile_number: mobile.map(str::to_string),
            bio: None,
        },
    )
    .await
    .expect("create musician")
}

fn payload(kind: NotificationKind, event_id: DbId, starts_at: Timestamp) -> NotificationPayload {
    NotificationPayload {
        kind,
        event_id,
        event_kind: EventKind::Service,
        event_starts_at: starts_at,
        event_location: Some("Main hall".to_string()),
        instrument: Some("keys".to_string()),
        note: None,
    }
}

async fn make_due(pool: &PgPool, job_id: DbId) {
    sqlx::query("UPDATE notification_jobs SET next_attempt_at = NOW() WHERE id = $1")
        .bind(job_id)
        .execute(pool)
        .await
        .expect("reschedule job");
}

async fn job(pool: &PgPool, job_id: DbId) -> NotificationJob {
    NotificationJobRepo::get(pool, job_id)
        .await
        .expect("get job")
        .expect("job exists")
}

/// Create an event starting `starts_in` from now, with a keys slot assigned
/// to the musician. Returns the event id.
async fn book(
    pool: &PgPool,
    leader: DbId,
    musician: DbId,
    starts_in: chrono::Duration,
) -> DbId {
    let starts = Utc::now() + starts_in;
    let event = EventRepo::create(
        pool,
        &CreateEvent {
            kind: EventKind::Service,
            starts_at: starts,
            ends_at: starts + chrono::Duration::hours(2),
            location: Some("Main hall".to_string()),
            theme: None,
            notes: None,
            created_by: leader,
        },
    )
    .await
    .expect("create event");
    let keys = InstrumentRepo::get_by_name(pool, "keys")
        .await
        .expect("catalog query")
        .expect("seeded instrument")
        .id;
    let slot = EventRepo::add_slot(
        pool,
        event,
        &CreateSlot {
            instrument_id: keys,
            role_label: None,
            position: 1,
        },
    )
    .await
    .expect("add slot");
    let mut tx = pool.begin().await.expect("begin");
    AssignmentRepo::claim_slot(&mut tx, slot, musician)
        .await
        .expect("claim slot");
    AssignmentRepo::create_in_tx(&mut tx, slot, event, musician, leader)
        .await
        .expect("create assignment");
    tx.commit().await.expect("commit");
    event
}

async fn seed_leader(pool: &PgPool) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: "leader".to_string(),
            email: "leader@example.ph".to_string(),
            nickname: None,
            role: Role::WorshipLeader,
        },
    )
    .await
    .expect("create leader")
}

// ---------------------------------------------------------------------------
// Delivery outcomes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_dispatch_sends_and_marks_sent(pool: PgPool) {
    let ana = seed_recipient(&pool, "ana", Some("09171234567")).await;
    let mock = MockMessenger::scripted(vec![Ok(())]);
    let dispatcher = Dispatcher::new(pool.clone(), mock.clone(), &NotifierConfig::default());

    let body_payload = payload(
        NotificationKind::AssignmentCreated,
        41,
        Utc::now() + chrono::Duration::days(3),
    );
    let job_id = selah_notifier::enqueue(&pool, ana, &body_payload)
        .await
        .expect("enqueue");

    let processed = dispatcher.drain_due().await.expect("drain");
    assert_eq!(processed, 1);

    let row = job(&pool, job_id).await;
    assert_eq!(row.status, "sent");
    assert_eq!(row.attempts, 1);
    assert_eq!(row.last_error, None);

    // Delivered to the normalized number with the rendered text.
    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "+639171234567");
    assert_eq!(calls[0].1, body_payload.sms_body());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_transient_failures_back_off_then_succeed(pool: PgPool) {
    let ana = seed_recipient(&pool, "ana", Some("09171234567")).await;
    let mock = MockMessenger::scripted(vec![
        transient("connection reset"),
        transient("connection reset"),
        transient("connection reset"),
    ]);
    let dispatcher = Dispatcher::new(pool.clone(), mock.clone(), &NotifierConfig::default());

    let job_id = NotificationJobRepo::enqueue(
        &pool,
        ana,
        &payload(NotificationKind::AssignmentCreated, 7, Utc::now()),
    )
    .await
    .expect("enqueue");

    // Three failing attempts, doubling the delay each time: 30s, 60s, 120s.
    for (expected_attempts, min_delay_secs) in [(1, 25), (2, 55), (3, 115)] {
        let processed = dispatcher.drain_due().await.expect("drain");
        assert_eq!(processed, 1);

        let row = job(&pool, job_id).await;
        assert_eq!(row.status, "failed_retryable");
        assert_eq!(row.attempts, expected_attempts);
        assert_eq!(row.last_error.as_deref(), Some("connection reset"));
        assert!(
            row.next_attempt_at > Utc::now() + chrono::Duration::seconds(min_delay_secs),
            "attempt {expected_attempts} must be rescheduled with backoff"
        );

        make_due(&pool, job_id).await;
    }

    // Fourth attempt succeeds.
    let processed = dispatcher.drain_due().await.expect("drain");
    assert_eq!(processed, 1);
    let row = job(&pool, job_id).await;
    assert_eq!(row.status, "sent");
    assert_eq!(row.attempts, 4);
    assert_eq!(row.last_error, None);
    assert_eq!(mock.calls().len(), 4);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_retries_exhaust_to_terminal(pool: PgPool) {
    let ana = seed_recipient(&pool, "ana", Some("09171234567")).await;
    let mock = MockMessenger::scripted(vec![
        transient("gateway returned HTTP 503"),
        transient("gateway returned HTTP 503"),
        transient("gateway returned HTTP 503"),
        transient("gateway returned HTTP 503"),
        transient("gateway returned HTTP 503"),
    ]);
    let dispatcher = Dispatcher::new(pool.clone(), mock.clone(), &NotifierConfig::default());

    let job_id = NotificationJobRepo::enqueue(
        &pool,
        ana,
        &payload(NotificationKind::AssignmentCreated, 7, Utc::now()),
    )
    .await
    .expect("enqueue");

    for attempt in 1..=5 {
        let processed = dispatcher.drain_due().await.expect("drain");
        assert_eq!(processed, 1);
        if attempt < 5 {
            make_due(&pool, job_id).await;
        }
    }

    let row = job(&pool, job_id).await;
    assert_eq!(row.status, "failed_terminal");
    assert_eq!(row.attempts, 5);
    assert_eq!(row.last_error.as_deref(), Some("gateway returned HTTP 503"));
    assert_eq!(mock.calls().len(), 5);

    // Terminal jobs are off the queue for good, even if somehow due again.
    make_due(&pool, job_id).await;
    let processed = dispatcher.drain_due().await.expect("drain");
    assert_eq!(processed, 0);
    assert_eq!(mock.calls().len(), 5);

    // And their state cannot be flipped.
    let flipped = NotificationJobRepo::mark_sent(&pool, job_id)
        .await
        .expect("mark sent");
    assert!(!flipped);
    assert_eq!(job(&pool, job_id).await.status, "failed_terminal");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_redelivery_after_crash_keeps_one_sent_job(pool: PgPool) {
    let ana = seed_recipient(&pool, "ana", Some("09171234567")).await;
    let mock = MockMessenger::scripted(vec![Ok(())]);
    let dispatcher = Dispatcher::new(pool.clone(), mock.clone(), &NotifierConfig::default());

    let job_id = selah_notifier::enqueue(
        &pool,
        ana,
        &payload(NotificationKind::AssignmentCreated, 7, Utc::now()),
    )
    .await
    .expect("enqueue");
    let dedup_key = job(&pool, job_id).await.dedup_key;

    // A worker claimed the job and died before recording an outcome: the
    // claim lapses and the job stays pending with its original dedup key.
    let claimed = NotificationJobRepo::claim_next(&pool, std::time::Duration::ZERO)
        .await
        .expect("claim")
        .expect("job is due");
    assert_eq!(claimed.id, job_id);

    let processed = dispatcher.drain_due().await.expect("drain");
    assert_eq!(processed, 1);

    let row = job(&pool, job_id).await;
    assert_eq!(row.status, "sent");
    assert_eq!(row.attempts, 1);
    assert_eq!(row.dedup_key, dedup_key);

    // The provider saw the same reference it would have seen the first time,
    // so a double delivery collapses on their side.
    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].2, dedup_key);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_permanent_failure_fails_immediately(pool: PgPool) {
    let ana = seed_recipient(&pool, "ana", Some("09171234567")).await;
    let mock = MockMessenger::scripted(vec![Err(SendError::Permanent(
        "invalid destination number".to_string(),
    ))]);
    let dispatcher = Dispatcher::new(pool.clone(), mock.clone(), &NotifierConfig::default());

    let job_id = NotificationJobRepo::enqueue(
        &pool,
        ana,
        &payload(NotificationKind::AssignmentRemoved, 7, Utc::now()),
    )
    .await
    .expect("enqueue");

    let processed = dispatcher.drain_due().await.expect("drain");
    assert_eq!(processed, 1);

    let row = job(&pool, job_id).await;
    assert_eq!(row.status, "failed_terminal");
    assert_eq!(row.attempts, 1);
    assert_eq!(row.last_error.as_deref(), Some("invalid destination number"));
    assert_eq!(mock.calls().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_unusable_contact_fails_terminally(pool: PgPool) {
    let no_number = seed_recipient(&pool, "ana", None).await;
    let bad_number = seed_recipient(&pool, "ben", Some("12345")).await;
    let mock = MockMessenger::scripted(vec![]);
    let dispatcher = Dispatcher::new(pool.clone(), mock.clone(), &NotifierConfig::default());

    let first = NotificationJobRepo::enqueue(
        &pool,
        no_number,
        &payload(NotificationKind::AssignmentCreated, 7, Utc::now()),
    )
    .await
    .expect("enqueue");
    let second = NotificationJobRepo::enqueue(
        &pool,
        bad_number,
        &payload(NotificationKind::AssignmentCreated, 7, Utc::now()),
    )
    .await
    .expect("enqueue");

    let processed = dispatcher.drain_due().await.expect("drain");
    assert_eq!(processed, 2);

    let row = job(&pool, first).await;
    assert_eq!(row.status, "failed_terminal");
    assert_eq!(row.last_error.as_deref(), Some("no mobile number on file"));
    let row = job(&pool, second).await;
    assert_eq!(row.status, "failed_terminal");
    assert_eq!(
        row.last_error.as_deref(),
        Some("mobile number on file is not usable")
    );

    // Nothing ever reached the gateway.
    assert!(mock.calls().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_corrupt_payload_fails_terminally(pool: PgPool) {
    let ana = seed_recipient(&pool, "ana", Some("09171234567")).await;
    let mock = MockMessenger::scripted(vec![]);
    let dispatcher = Dispatcher::new(pool.clone(), mock.clone(), &NotifierConfig::default());

    let job_id: DbId = sqlx::query_scalar(
        "INSERT INTO notification_jobs (dedup_key, recipient_id, payload) \
         VALUES ($1, $2, $3) \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(ana)
    .bind(sqlx::types::Json(serde_json::json!({ "kind": "carrier_pigeon" })))
    .fetch_one(&pool)
    .await
    .expect("insert raw job");

    let processed = dispatcher.drain_due().await.expect("drain");
    assert_eq!(processed, 1);

    let row = job(&pool, job_id).await;
    assert_eq!(row.status, "failed_terminal");
    assert!(row
        .last_error
        .as_deref()
        .is_some_and(|e| e.starts_with("undecodable payload")));
    assert!(mock.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Reminder scanning
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_scan_queues_day_and_hour_reminders_once(pool: PgPool) {
    let leader = seed_leader(&pool).await;
    let ana = seed_recipient(&pool, "ana", Some("09171234567")).await;
    let event = book(&pool, leader, ana, chrono::Duration::minutes(24 * 60 + 30)).await;

    let scanner = ReminderScanner::new(pool.clone(), &NotifierConfig::default());
    let queued = scanner.scan().await.expect("scan");
    assert_eq!(queued, 2);

    let jobs = NotificationJobRepo::list_for_recipient(&pool, ana)
        .await
        .expect("list jobs");
    assert_eq!(jobs.len(), 2);
    let day = jobs
        .iter()
        .find(|j| {
            j.decode_payload().unwrap().kind == NotificationKind::ReminderDayBefore
        })
        .expect("day-before queued");
    let hour = jobs
        .iter()
        .find(|j| {
            j.decode_payload().unwrap().kind == NotificationKind::ReminderHourBefore
        })
        .expect("hour-before queued");
    for reminder in [day, hour] {
        let decoded = reminder.decode_payload().expect("decode");
        assert_eq!(decoded.event_id, event);
        assert_eq!(decoded.instrument.as_deref(), Some("keys"));
        assert_eq!(reminder.status, "pending");
    }
    // Scheduled for their lead times, not for now.
    assert!(day.next_attempt_at < Utc::now() + chrono::Duration::hours(1));
    assert!(hour.next_attempt_at > Utc::now() + chrono::Duration::hours(23));

    // Rescanning changes nothing.
    let queued = scanner.scan().await.expect("rescan");
    assert_eq!(queued, 0);
    let jobs = NotificationJobRepo::list_for_recipient(&pool, ana)
        .await
        .expect("list jobs");
    assert_eq!(jobs.len(), 2);

    // Neither reminder is due yet, so the dispatcher leaves them alone.
    let mock = MockMessenger::scripted(vec![]);
    let dispatcher = Dispatcher::new(pool.clone(), mock.clone(), &NotifierConfig::default());
    let processed = dispatcher.drain_due().await.expect("drain");
    assert_eq!(processed, 0);
    assert!(mock.calls().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_scan_skips_stale_reminders_and_sends_due_ones(pool: PgPool) {
    let leader = seed_leader(&pool).await;
    let ana = seed_recipient(&pool, "ana", Some("09171234567")).await;
    let ben = seed_recipient(&pool, "ben", Some("09181234567")).await;

    // Ana was booked 30 minutes before the service: both lead times have
    // long passed, so she gets no reminder (the assignment text covered it).
    book(&pool, leader, ana, chrono::Duration::minutes(30)).await;
    // Ben's service is just under an hour out; the hour-before moment was
    // two minutes ago, still within the scanner's grace.
    book(&pool, leader, ben, chrono::Duration::minutes(58)).await;

    let scanner = ReminderScanner::new(pool.clone(), &NotifierConfig::default());
    let queued = scanner.scan().await.expect("scan");
    assert_eq!(queued, 1);

    let ana_jobs = NotificationJobRepo::list_for_recipient(&pool, ana)
        .await
        .expect("list jobs");
    assert!(ana_jobs.is_empty());

    let mock = MockMessenger::scripted(vec![Ok(())]);
    let dispatcher = Dispatcher::new(pool.clone(), mock.clone(), &NotifierConfig::default());
    let processed = dispatcher.drain_due().await.expect("drain");
    assert_eq!(processed, 1);

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "+639181234567");
    assert!(calls[0].1.starts_with("Starting soon:"));

    let ben_jobs = NotificationJobRepo::list_for_recipient(&pool, ben)
        .await
        .expect("list jobs");
    assert_eq!(ben_jobs.len(), 1);
    assert_eq!(ben_jobs[0].status, "sent");
}
