//! Selah notification worker.
//!
//! Notifications are durable rows in the `notification_jobs` table, written
//! by the scheduling layer in the same transaction as the change they
//! announce. This crate drains that queue:
//!
//! - [`Dispatcher`]: claims due jobs and delivers them through a
//!   [`Messenger`], with exponential-backoff retries.
//! - [`ReminderScanner`]: queues day-before and hour-before reminders for
//!   upcoming assignments.
//! - [`HttpSmsGateway`]: the production SMS transport.

pub mod config;
pub mod dispatcher;
pub mod messenger;
pub mod reminders;

pub use config::NotifierConfig;
pub use dispatcher::Dispatcher;
pub use messenger::{HttpSmsGateway, Messenger, SendError};
pub use reminders::ReminderScanner;

use selah_core::notify::NotificationPayload;
use selah_core::types::DbId;
use selah_db::repositories::NotificationJobRepo;
use selah_db::DbPool;

/// Queue a notification for immediate delivery, returning the job id.
///
/// Producer-side entry point for code outside a scheduling transaction; the
/// scheduling layer itself inserts through
/// `NotificationJobRepo::enqueue_in_tx` so the job commits together with the
/// change it announces. Only storage unavailability fails.
pub async fn enqueue(
    pool: &DbPool,
    recipient_id: DbId,
    payload: &NotificationPayload,
) -> Result<DbId, sqlx::Error> {
    NotificationJobRepo::enqueue(pool, recipient_id, payload).await
}
