//! Upcoming-event reminder scanning.
//!
//! [`ReminderScanner`] periodically walks assignments for events starting
//! within the next day and queues a day-before and an hour-before reminder
//! for each, due at its lead time. A partial unique index over
//! `(recipient, kind, event)` makes the insert idempotent, so rescanning or
//! running several scanners never duplicates a reminder.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use selah_core::calendar::EventKind;
use selah_core::notify::{NotificationKind, NotificationPayload};
use selah_db::repositories::{AssignmentRepo, NotificationJobRepo};
use selah_db::DbPool;

use crate::config::NotifierConfig;

/// Reminder kinds and how far ahead of the event each one fires.
fn reminder_leads() -> [(NotificationKind, chrono::Duration); 2] {
    [
        (NotificationKind::ReminderDayBefore, chrono::Duration::hours(24)),
        (NotificationKind::ReminderHourBefore, chrono::Duration::hours(1)),
    ]
}

/// Background service that turns upcoming assignments into reminder jobs.
pub struct ReminderScanner {
    pool: DbPool,
    scan_interval: Duration,
}

impl ReminderScanner {
    pub fn new(pool: DbPool, config: &NotifierConfig) -> Self {
        Self {
            pool,
            scan_interval: Duration::from_secs(config.reminder_scan_interval_secs),
        }
    }

    /// Run the scan loop until the token is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.scan_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reminder scanner cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.scan().await {
                        tracing::error!(error = %e, "Reminder scan failed");
                    }
                }
            }
        }
    }

    /// Queue reminders for every assignment whose event starts within the
    /// next day. Returns how many new jobs were queued.
    ///
    /// A reminder whose lead time already passed when the assignment first
    /// shows up (someone booked last-minute) is skipped rather than sent
    /// stale; the assignment notification itself covered them.
    pub async fn scan(&self) -> Result<usize, sqlx::Error> {
        let now = Utc::now();
        let horizon = now + chrono::Duration::hours(25);
        let grace =
            chrono::Duration::from_std(self.scan_interval).unwrap_or(chrono::Duration::seconds(300));

        let upcoming = AssignmentRepo::upcoming(&self.pool, now, horizon).await?;
        let mut queued = 0;
        for entry in &upcoming {
            let Some(event_kind) = EventKind::parse(&entry.event_kind) else {
                tracing::error!(
                    event_id = entry.event_id,
                    kind = %entry.event_kind,
                    "Unknown event kind, skipping reminders"
                );
                continue;
            };
            for (kind, lead) in reminder_leads() {
                let due = entry.starts_at - lead;
                if due < now - grace {
                    continue;
                }
                let payload = NotificationPayload {
                    kind,
                    event_id: entry.event_id,
                    event_kind,
                    event_starts_at: entry.starts_at,
                    event_location: entry.location.clone(),
                    instrument: Some(entry.instrument_name.clone()),
                    note: None,
                };
                let inserted = NotificationJobRepo::enqueue_reminder_if_absent(
                    &self.pool,
                    entry.musician_id,
                    &payload,
                    due.max(now),
                )
                .await?;
                if inserted.is_some() {
                    queued += 1;
                }
            }
        }

        if queued > 0 {
            tracing::info!(queued, "Queued reminders");
        }
        Ok(queued)
    }
}
