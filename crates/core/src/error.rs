//! Domain error taxonomy.
//!
//! Three families matter to callers:
//! - policy errors ([`Denied`](ScheduleError::Denied),
//!   [`CapabilityMismatch`](ScheduleError::CapabilityMismatch)), where the
//!   intent is structurally invalid for the actor or target and will never
//!   succeed on retry;
//! - conflict errors ([`AvailabilityConflict`](ScheduleError::AvailabilityConflict),
//!   [`DoubleBooking`](ScheduleError::DoubleBooking),
//!   [`SlotAlreadyFilled`](ScheduleError::SlotAlreadyFilled)), where the
//!   intent is valid but inconsistent with current state; each carries enough
//!   structure for the caller to render an actionable message;
//! - lookup/validation errors ([`NotFound`](ScheduleError::NotFound),
//!   [`SlotMismatch`](ScheduleError::SlotMismatch),
//!   [`InvalidWindow`](ScheduleError::InvalidWindow)).
//!
//! Transient storage errors are not represented here; `selah-scheduling`
//! wraps this enum together with `sqlx::Error` at the crate boundary.

use crate::capability::{Action, DenyReason, Role};
use crate::types::{DbId, Timestamp};
use crate::window::TimeWindow;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("slot {slot_id} does not belong to event {event_id}")]
    SlotMismatch { slot_id: DbId, event_id: DbId },

    #[error("window end {end} must be after start {start}")]
    InvalidWindow { start: Timestamp, end: Timestamp },

    #[error("musician {musician_id} does not play {instrument}")]
    CapabilityMismatch { musician_id: DbId, instrument: String },

    #[error("{action} denied for role {role}: {reason}")]
    Denied {
        role: Role,
        action: Action,
        reason: DenyReason,
    },

    #[error("musician {musician_id} is unavailable during {window} (block {block_id})")]
    AvailabilityConflict {
        musician_id: DbId,
        block_id: DbId,
        window: TimeWindow,
    },

    #[error("musician {musician_id} already holds assignment {assignment_id} during {window}")]
    DoubleBooking {
        musician_id: DbId,
        assignment_id: DbId,
        window: TimeWindow,
    },

    #[error("slot {slot_id} is already filled")]
    SlotAlreadyFilled { slot_id: DbId },
}

impl ScheduleError {
    /// Whether the intent can never succeed for this actor/target
    /// (as opposed to being blocked by current state).
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            ScheduleError::Denied { .. } | ScheduleError::CapabilityMismatch { .. }
        )
    }

    /// Whether the intent is valid but currently inconsistent with existing
    /// state (a later retry against changed state may succeed).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ScheduleError::AvailabilityConflict { .. }
                | ScheduleError::DoubleBooking { .. }
                | ScheduleError::SlotAlreadyFilled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn policy_and_conflict_families_are_disjoint() {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 11, 30, 0).unwrap(),
        )
        .unwrap();

        let policy = ScheduleError::CapabilityMismatch {
            musician_id: 1,
            instrument: "drums".into(),
        };
        let conflict = ScheduleError::DoubleBooking {
            musician_id: 1,
            assignment_id: 7,
            window,
        };
        let lookup = ScheduleError::NotFound {
            entity: "event",
            id: 9,
        };

        assert!(policy.is_policy() && !policy.is_conflict());
        assert!(conflict.is_conflict() && !conflict.is_policy());
        assert!(!lookup.is_policy() && !lookup.is_conflict());
    }

    #[test]
    fn conflict_detail_renders_window() {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 11, 30, 0).unwrap(),
        )
        .unwrap();
        let err = ScheduleError::AvailabilityConflict {
            musician_id: 3,
            block_id: 12,
            window,
        };
        let msg = err.to_string();
        assert!(msg.contains("musician 3"));
        assert!(msg.contains("block 12"));
        assert!(msg.contains("2026-03-01 10:00"));
    }
}
