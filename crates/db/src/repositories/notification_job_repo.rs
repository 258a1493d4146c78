//! Repository for the `notification_jobs` queue.
//!
//! The queue is plain Postgres. Claims use `FOR UPDATE SKIP LOCKED` so any
//! number of workers can poll the same table without dispatching a job
//! twice, and every status update is guarded by a non-terminal status
//! predicate so terminal states stay immutable no matter who races whom.

use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use selah_core::notify::{JobStatus, NotificationPayload};
use selah_core::types::{DbId, Timestamp};

use crate::models::notification_job::NotificationJob;

/// Column list for `notification_jobs` queries.
const COLUMNS: &str = "id, dedup_key, recipient_id, payload, status, attempts, \
     next_attempt_at, last_error, created_at, updated_at";

/// Provides the durable notification job queue.
pub struct NotificationJobRepo;

impl NotificationJobRepo {
    // -----------------------------------------------------------------------
    // Enqueue
    // -----------------------------------------------------------------------

    /// Enqueue a pending job due immediately, returning the generated ID.
    pub async fn enqueue(
        pool: &PgPool,
        recipient_id: DbId,
        payload: &NotificationPayload,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notification_jobs (dedup_key, recipient_id, payload) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(recipient_id)
        .bind(sqlx::types::Json(payload))
        .fetch_one(pool)
        .await
    }

    /// Enqueue within a caller-owned transaction, so the job commits or
    /// rolls back together with the mutation that caused it.
    pub async fn enqueue_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        recipient_id: DbId,
        payload: &NotificationPayload,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notification_jobs (dedup_key, recipient_id, payload) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(recipient_id)
        .bind(sqlx::types::Json(payload))
        .fetch_one(&mut **tx)
        .await
    }

    /// Enqueue a reminder due at `due_at`, unless a reminder of the same
    /// kind for the same recipient and event already exists (enforced by a
    /// partial unique index, so concurrent scanners cannot double-insert).
    ///
    /// Returns the new job ID, or `None` when the reminder was already
    /// queued.
    pub async fn enqueue_reminder_if_absent(
        pool: &PgPool,
        recipient_id: DbId,
        payload: &NotificationPayload,
        due_at: Timestamp,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notification_jobs \
                 (dedup_key, recipient_id, payload, next_attempt_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT DO NOTHING \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(recipient_id)
        .bind(sqlx::types::Json(payload))
        .bind(due_at)
        .fetch_optional(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Claim
    // -----------------------------------------------------------------------

    /// Atomically claim the next due job for delivery.
    ///
    /// The claim pushes `next_attempt_at` forward by `lease`, which keeps
    /// other workers off the job while this one delivers. If the worker dies
    /// mid-delivery the job resurfaces when the lease expires; a duplicate
    /// delivery in that window is acceptable and collapsed by `dedup_key`
    /// where the provider supports it.
    pub async fn claim_next(
        pool: &PgPool,
        lease: Duration,
    ) -> Result<Option<NotificationJob>, sqlx::Error> {
        let query = format!(
            "UPDATE notification_jobs \
             SET next_attempt_at = NOW() + make_interval(secs => $1), updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM notification_jobs \
                 WHERE status IN ($2, $3) AND next_attempt_at <= NOW() \
                 ORDER BY next_attempt_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationJob>(&query)
            .bind(lease.as_secs_f64())
            .bind(JobStatus::Pending.as_str())
            .bind(JobStatus::FailedRetryable.as_str())
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Outcome transitions
    // -----------------------------------------------------------------------

    /// Record a successful delivery. Terminal.
    ///
    /// Returns `false` when the job was already in a terminal state.
    pub async fn mark_sent(pool: &PgPool, job_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notification_jobs \
             SET status = $2, attempts = attempts + 1, last_error = NULL, \
                 updated_at = NOW() \
             WHERE id = $1 AND status IN ($3, $4)",
        )
        .bind(job_id)
        .bind(JobStatus::Sent.as_str())
        .bind(JobStatus::Pending.as_str())
        .bind(JobStatus::FailedRetryable.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a failed attempt that will be retried after `delay`.
    pub async fn mark_retry(
        pool: &PgPool,
        job_id: DbId,
        error: &str,
        delay: Duration,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notification_jobs \
             SET status = $2, attempts = attempts + 1, last_error = $5, \
                 next_attempt_at = NOW() + make_interval(secs => $6), \
                 updated_at = NOW() \
             WHERE id = $1 AND status IN ($3, $4)",
        )
        .bind(job_id)
        .bind(JobStatus::FailedRetryable.as_str())
        .bind(JobStatus::Pending.as_str())
        .bind(JobStatus::FailedRetryable.as_str())
        .bind(error)
        .bind(delay.as_secs_f64())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a permanently failed attempt. Terminal.
    pub async fn mark_terminal(
        pool: &PgPool,
        job_id: DbId,
        error: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notification_jobs \
             SET status = $2, attempts = attempts + 1, last_error = $5, \
                 updated_at = NOW() \
             WHERE id = $1 AND status IN ($3, $4)",
        )
        .bind(job_id)
        .bind(JobStatus::FailedTerminal.as_str())
        .bind(JobStatus::Pending.as_str())
        .bind(JobStatus::FailedRetryable.as_str())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Fetch a job by ID.
    pub async fn get(pool: &PgPool, job_id: DbId) -> Result<Option<NotificationJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_jobs WHERE id = $1");
        sqlx::query_as::<_, NotificationJob>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// All jobs for a recipient, oldest first.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient_id: DbId,
    ) -> Result<Vec<NotificationJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_jobs \
             WHERE recipient_id = $1 \
             ORDER BY id"
        );
        sqlx::query_as::<_, NotificationJob>(&query)
            .bind(recipient_id)
            .fetch_all(pool)
            .await
    }

    /// Number of jobs per status, for operator visibility.
    pub async fn counts_by_status(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM notification_jobs GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await
    }
}
