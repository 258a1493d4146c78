//! The delivery loop.
//!
//! [`Dispatcher`] polls the `notification_jobs` table, claims due jobs one
//! at a time, renders the SMS text, and hands it to a [`Messenger`]. Every
//! claim uses `FOR UPDATE SKIP LOCKED` under a lease, so any number of
//! dispatcher processes can share a queue.
//!
//! Outcome handling:
//! - success marks the job `sent`
//! - a transient failure reschedules it with exponential backoff, until the
//!   attempt ceiling fails it terminally
//! - a permanent failure (or an unusable recipient or payload) fails it
//!   terminally at once

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use selah_core::backoff::{BackoffPolicy, RetryDecision};
use selah_core::phone;
use selah_db::models::notification_job::NotificationJob;
use selah_db::repositories::{MusicianRepo, NotificationJobRepo};
use selah_db::DbPool;

use crate::config::NotifierConfig;
use crate::messenger::{Messenger, SendError};

/// Background service that drains the notification job queue.
pub struct Dispatcher {
    pool: DbPool,
    messenger: Arc<dyn Messenger>,
    policy: BackoffPolicy,
    poll_interval: Duration,
    send_timeout: Duration,
    claim_lease: Duration,
}

impl Dispatcher {
    /// Create a dispatcher that delivers through the given messenger.
    pub fn new(pool: DbPool, messenger: Arc<dyn Messenger>, config: &NotifierConfig) -> Self {
        Self {
            pool,
            messenger,
            policy: config.backoff_policy(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            send_timeout: Duration::from_secs(config.send_timeout_secs),
            claim_lease: Duration::from_secs(config.claim_lease_secs),
        }
    }

    /// Run the dispatch loop until the token is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Dispatcher cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match self.drain_due().await {
                        Ok(0) => {}
                        Ok(count) => tracing::debug!(count, "Drained notification queue"),
                        Err(e) => tracing::error!(error = %e, "Failed to drain notification queue"),
                    }
                }
            }
        }
    }

    /// Claim and process every currently-due job. Returns how many jobs were
    /// handled.
    pub async fn drain_due(&self) -> Result<usize, sqlx::Error> {
        let mut processed = 0;
        while let Some(job) =
            NotificationJobRepo::claim_next(&self.pool, self.claim_lease).await?
        {
            self.process(job).await?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Deliver one claimed job and record the outcome.
    async fn process(&self, job: NotificationJob) -> Result<(), sqlx::Error> {
        let payload = match job.decode_payload() {
            Ok(payload) => payload,
            Err(e) => {
                NotificationJobRepo::mark_terminal(
                    &self.pool,
                    job.id,
                    &format!("undecodable payload: {e}"),
                )
                .await?;
                tracing::error!(job_id = job.id, error = %e, "Undecodable payload, failing job");
                return Ok(());
            }
        };

        let contact = match MusicianRepo::get(&self.pool, job.recipient_id).await? {
            None => Err("recipient musician no longer exists"),
            Some(musician) => match musician.mobile_number.as_deref() {
                None => Err("no mobile number on file"),
                Some(raw) => phone::normalize(raw).ok_or("mobile number on file is not usable"),
            },
        };
        let number = match contact {
            Ok(number) => number,
            Err(reason) => {
                NotificationJobRepo::mark_terminal(&self.pool, job.id, reason).await?;
                tracing::error!(
                    job_id = job.id,
                    recipient_id = job.recipient_id,
                    reason,
                    "No usable contact for recipient, failing job"
                );
                return Ok(());
            }
        };

        let body = payload.sms_body();
        let attempt = job.attempts as u32 + 1;
        let result = match tokio::time::timeout(
            self.send_timeout,
            self.messenger.send(&number, &body, job.dedup_key),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SendError::Transient(format!(
                "no response within {}s",
                self.send_timeout.as_secs()
            ))),
        };

        match result {
            Ok(()) => {
                NotificationJobRepo::mark_sent(&self.pool, job.id).await?;
                tracing::info!(
                    job_id = job.id,
                    recipient_id = job.recipient_id,
                    attempt,
                    "Notification sent"
                );
            }
            Err(SendError::Permanent(reason)) => {
                NotificationJobRepo::mark_terminal(&self.pool, job.id, &reason).await?;
                tracing::error!(
                    job_id = job.id,
                    attempt,
                    error = %reason,
                    "Delivery rejected, failing job"
                );
            }
            Err(SendError::Transient(reason)) => match self.policy.decide(attempt) {
                RetryDecision::RetryAfter(delay) => {
                    NotificationJobRepo::mark_retry(&self.pool, job.id, &reason, delay).await?;
                    tracing::warn!(
                        job_id = job.id,
                        attempt,
                        retry_in_secs = delay.as_secs(),
                        error = %reason,
                        "Delivery failed, will retry"
                    );
                }
                RetryDecision::GiveUp => {
                    NotificationJobRepo::mark_terminal(&self.pool, job.id, &reason).await?;
                    tracing::error!(
                        job_id = job.id,
                        attempt,
                        error = %reason,
                        "Delivery failed, retries exhausted"
                    );
                }
            },
        }
        Ok(())
    }
}
