//! Notification job vocabulary: statuses, kinds, payloads.
//!
//! This module lives in `core` (zero internal deps) so the same status state
//! machine is shared by the repository layer and the delivery worker.

use serde::{Deserialize, Serialize};

use crate::calendar::EventKind;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Job status
// ---------------------------------------------------------------------------

/// Lifecycle states of a notification job, stored as TEXT in
/// `notification_jobs.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Awaiting its (first or next) delivery attempt.
    Pending,
    /// Delivered. Terminal.
    Sent,
    /// Last attempt failed but the job will be retried.
    FailedRetryable,
    /// Gave up after exhausting attempts, or hit a permanent error. Terminal.
    FailedTerminal,
}

impl JobStatus {
    /// The database/text representation.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Sent => "sent",
            JobStatus::FailedRetryable => "failed_retryable",
            JobStatus::FailedTerminal => "failed_terminal",
        }
    }

    /// Parse the database/text representation.
    pub fn parse(s: &str) -> Option<JobStatus> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "sent" => Some(JobStatus::Sent),
            "failed_retryable" => Some(JobStatus::FailedRetryable),
            "failed_terminal" => Some(JobStatus::FailedTerminal),
            _ => None,
        }
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(self) -> bool {
        state_machine::valid_transitions(self).is_empty()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Forward-only job status transitions.
///
/// A claimed job either succeeds (`Sent`), fails with retries remaining
/// (`FailedRetryable`), or fails for good (`FailedTerminal`). A retryable job
/// goes back through delivery and ends in one of the two terminal states; it
/// never returns to `Pending`.
pub mod state_machine {
    use super::JobStatus;

    /// Returns the set of valid target statuses reachable from `from`.
    ///
    /// Terminal states (`Sent`, `FailedTerminal`) return an empty slice
    /// because no further transitions are allowed.
    pub fn valid_transitions(from: JobStatus) -> &'static [JobStatus] {
        match from {
            JobStatus::Pending => &[
                JobStatus::Sent,
                JobStatus::FailedRetryable,
                JobStatus::FailedTerminal,
            ],
            JobStatus::FailedRetryable => &[JobStatus::Sent, JobStatus::FailedTerminal],
            JobStatus::Sent | JobStatus::FailedTerminal => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition, returning an error message for invalid ones.
    pub fn validate_transition(from: JobStatus, to: JobStatus) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(format!("Invalid transition: {from} -> {to}"))
        }
    }
}

// ---------------------------------------------------------------------------
// Notification kinds
// ---------------------------------------------------------------------------

/// What a notification is about. Stored as TEXT in `notification_jobs.kind`
/// and inside the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AssignmentCreated,
    AssignmentRemoved,
    EventCancelled,
    ReminderDayBefore,
    ReminderHourBefore,
}

impl NotificationKind {
    /// The database/text representation.
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::AssignmentCreated => "assignment_created",
            NotificationKind::AssignmentRemoved => "assignment_removed",
            NotificationKind::EventCancelled => "event_cancelled",
            NotificationKind::ReminderDayBefore => "reminder_day_before",
            NotificationKind::ReminderHourBefore => "reminder_hour_before",
        }
    }

    /// Parse the database/text representation.
    pub fn parse(s: &str) -> Option<NotificationKind> {
        match s {
            "assignment_created" => Some(NotificationKind::AssignmentCreated),
            "assignment_removed" => Some(NotificationKind::AssignmentRemoved),
            "event_cancelled" => Some(NotificationKind::EventCancelled),
            "reminder_day_before" => Some(NotificationKind::ReminderDayBefore),
            "reminder_hour_before" => Some(NotificationKind::ReminderHourBefore),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Everything needed to render a notification at delivery time, captured when
/// the job is enqueued and stored as JSONB.
///
/// Rendering happens in the worker, not at enqueue time, so the payload keeps
/// structured fields rather than a prebaked string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub kind: NotificationKind,
    pub event_id: DbId,
    pub event_kind: EventKind,
    pub event_starts_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_location: Option<String>,
    /// Instrument name for assignment notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    /// Free-text note from whoever made the assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl NotificationPayload {
    /// Render the SMS text for this payload.
    pub fn sms_body(&self) -> String {
        let when = self.event_starts_at.format("%a, %b %-d at %-I:%M %p");
        let label = self.event_kind.label();
        let mut body = match self.kind {
            NotificationKind::AssignmentCreated => match &self.instrument {
                Some(instrument) => {
                    format!("You're scheduled to play {instrument} at the {label} on {when}.")
                }
                None => format!("You're scheduled for the {label} on {when}."),
            },
            NotificationKind::AssignmentRemoved => {
                format!("You've been taken off the {label} on {when}.")
            }
            NotificationKind::EventCancelled => {
                format!("The {label} on {when} has been cancelled.")
            }
            NotificationKind::ReminderDayBefore => match &self.instrument {
                Some(instrument) => {
                    format!("Reminder: {label} tomorrow, {when}. You're on {instrument}.")
                }
                None => format!("Reminder: {label} tomorrow, {when}."),
            },
            NotificationKind::ReminderHourBefore => {
                format!("Starting soon: {label} at {when}.")
            }
        };
        if self.kind != NotificationKind::AssignmentRemoved
            && self.kind != NotificationKind::EventCancelled
        {
            if let Some(location) = &self.event_location {
                body.push_str(&format!(" Location: {location}."));
            }
        }
        if let Some(note) = &self.note {
            body.push_str(&format!(" Note: {note}"));
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::state_machine::*;
    use super::*;
    use chrono::TimeZone;

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    #[test]
    fn pending_to_sent() {
        assert!(can_transition(JobStatus::Pending, JobStatus::Sent));
    }

    #[test]
    fn pending_to_failed_retryable() {
        assert!(can_transition(JobStatus::Pending, JobStatus::FailedRetryable));
    }

    #[test]
    fn pending_to_failed_terminal() {
        assert!(can_transition(JobStatus::Pending, JobStatus::FailedTerminal));
    }

    #[test]
    fn failed_retryable_to_sent() {
        assert!(can_transition(JobStatus::FailedRetryable, JobStatus::Sent));
    }

    #[test]
    fn failed_retryable_to_failed_terminal() {
        assert!(can_transition(
            JobStatus::FailedRetryable,
            JobStatus::FailedTerminal
        ));
    }

    #[test]
    fn no_transition_back_to_pending() {
        assert!(!can_transition(JobStatus::FailedRetryable, JobStatus::Pending));
        assert!(!can_transition(JobStatus::Sent, JobStatus::Pending));
        assert!(!can_transition(JobStatus::FailedTerminal, JobStatus::Pending));
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        assert!(valid_transitions(JobStatus::Sent).is_empty());
        assert!(valid_transitions(JobStatus::FailedTerminal).is_empty());
        assert!(JobStatus::Sent.is_terminal());
        assert!(JobStatus::FailedTerminal.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::FailedRetryable.is_terminal());
    }

    #[test]
    fn validate_transition_reports_both_states() {
        let err = validate_transition(JobStatus::Sent, JobStatus::Pending).unwrap_err();
        assert!(err.contains("sent"));
        assert!(err.contains("pending"));
    }

    // -----------------------------------------------------------------------
    // Text representations
    // -----------------------------------------------------------------------

    #[test]
    fn status_text_round_trips() {
        for status in [
            JobStatus::Pending,
            JobStatus::Sent,
            JobStatus::FailedRetryable,
            JobStatus::FailedTerminal,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("retrying"), None);
    }

    #[test]
    fn kind_text_round_trips() {
        for kind in [
            NotificationKind::AssignmentCreated,
            NotificationKind::AssignmentRemoved,
            NotificationKind::EventCancelled,
            NotificationKind::ReminderDayBefore,
            NotificationKind::ReminderHourBefore,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("practice_assignment"), None);
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    fn payload(kind: NotificationKind) -> NotificationPayload {
        NotificationPayload {
            kind,
            event_id: 7,
            event_kind: EventKind::Practice,
            event_starts_at: chrono::Utc.with_ymd_and_hms(2025, 3, 6, 19, 30, 0).unwrap(),
            event_location: Some("Main hall".to_string()),
            instrument: Some("acoustic guitar".to_string()),
            note: None,
        }
    }

    #[test]
    fn assignment_body_names_instrument_and_location() {
        let body = payload(NotificationKind::AssignmentCreated).sms_body();
        assert_eq!(
            body,
            "You're scheduled to play acoustic guitar at the practice on \
             Thu, Mar 6 at 7:30 PM. Location: Main hall."
        );
    }

    #[test]
    fn removal_body_skips_location() {
        let body = payload(NotificationKind::AssignmentRemoved).sms_body();
        assert_eq!(body, "You've been taken off the practice on Thu, Mar 6 at 7:30 PM.");
    }

    #[test]
    fn cancellation_body() {
        let body = payload(NotificationKind::EventCancelled).sms_body();
        assert_eq!(body, "The practice on Thu, Mar 6 at 7:30 PM has been cancelled.");
    }

    #[test]
    fn reminder_bodies() {
        let day = payload(NotificationKind::ReminderDayBefore).sms_body();
        assert_eq!(
            day,
            "Reminder: practice tomorrow, Thu, Mar 6 at 7:30 PM. You're on acoustic guitar. \
             Location: Main hall."
        );
        let hour = payload(NotificationKind::ReminderHourBefore).sms_body();
        assert_eq!(hour, "Starting soon: practice at Thu, Mar 6 at 7:30 PM. Location: Main hall.");
    }

    #[test]
    fn note_is_appended() {
        let mut p = payload(NotificationKind::AssignmentCreated);
        p.event_location = None;
        p.note = Some("bring the capo".to_string());
        assert_eq!(
            p.sms_body(),
            "You're scheduled to play acoustic guitar at the practice on \
             Thu, Mar 6 at 7:30 PM. Note: bring the capo"
        );
    }

    #[test]
    fn payload_json_round_trips() {
        let p = payload(NotificationKind::ReminderDayBefore);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["kind"], "reminder_day_before");
        assert_eq!(json["event_kind"], "practice");
        let back: NotificationPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
