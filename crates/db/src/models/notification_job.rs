//! Notification job queue model.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use selah_core::notify::{JobStatus, NotificationPayload};
use selah_core::types::{DbId, Timestamp};

/// A row from the `notification_jobs` table.
///
/// Jobs are durable: they survive worker restarts and can be resumed by any
/// worker. `status` holds the text form of [`JobStatus`]; `attempts` counts
/// completed delivery attempts; `next_attempt_at` is both the retry schedule
/// and the claim lease.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationJob {
    pub id: DbId,
    /// Stable per-job key handed to the messaging provider so a redelivery
    /// after a crash can be collapsed on their side.
    pub dedup_key: Uuid,
    pub recipient_id: DbId,
    pub payload: serde_json::Value,
    pub status: String,
    pub attempts: i32,
    pub next_attempt_at: Timestamp,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationJob {
    /// Typed status, if the stored text is recognized.
    pub fn job_status(&self) -> Option<JobStatus> {
        JobStatus::parse(&self.status)
    }

    /// Decode the JSONB payload.
    pub fn decode_payload(&self) -> Result<NotificationPayload, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}
