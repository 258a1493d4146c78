//! Error type for scheduling operations.

use selah_core::error::ScheduleError;

/// Failure of a scheduling operation: either a domain rule said no, or the
/// storage layer failed.
///
/// Wraps [`ScheduleError`] for domain errors, mirrored by [`kind`] for
/// callers that only need the coarse class.
///
/// [`kind`]: SchedulingError::kind
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    /// A domain-level error from `selah_core`.
    #[error(transparent)]
    Domain(#[from] ScheduleError),

    /// A database error from sqlx. Nothing was applied.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for scheduling return values.
pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Coarse classification for callers mapping errors to a UI or wire status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The actor or musician lacks a required capability.
    Policy,
    /// The request lost against existing schedule state.
    Conflict,
    /// A referenced entity does not exist.
    NotFound,
    /// The request itself is malformed.
    Validation,
    /// Storage failed.
    Fatal,
}

impl SchedulingError {
    /// Classify this error for the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulingError::Domain(domain) => match domain {
                ScheduleError::NotFound { .. } | ScheduleError::SlotMismatch { .. } => {
                    ErrorKind::NotFound
                }
                ScheduleError::InvalidWindow { .. } => ErrorKind::Validation,
                ScheduleError::Denied { .. } | ScheduleError::CapabilityMismatch { .. } => {
                    ErrorKind::Policy
                }
                ScheduleError::AvailabilityConflict { .. }
                | ScheduleError::DoubleBooking { .. }
                | ScheduleError::SlotAlreadyFilled { .. } => ErrorKind::Conflict,
            },
            SchedulingError::Database(_) => ErrorKind::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_track_domain_classes() {
        let denied = SchedulingError::Domain(ScheduleError::SlotAlreadyFilled { slot_id: 1 });
        assert_eq!(denied.kind(), ErrorKind::Conflict);

        let missing = SchedulingError::Domain(ScheduleError::NotFound {
            entity: "event",
            id: 9,
        });
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let db = SchedulingError::Database(sqlx::Error::PoolClosed);
        assert_eq!(db.kind(), ErrorKind::Fatal);
    }
}
