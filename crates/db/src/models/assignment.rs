//! Assignment models: the committed record plus the joined scan rows.

use serde::Serialize;
use sqlx::FromRow;

use selah_core::error::ScheduleError;
use selah_core::types::{DbId, Timestamp};
use selah_core::window::TimeWindow;

/// A row from the `assignments` table. One per filled slot; the slot's
/// `musician_id` cell and this record are written in the same transaction.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assignment {
    pub id: DbId,
    pub slot_id: DbId,
    pub event_id: DbId,
    pub musician_id: DbId,
    pub assigned_by: DbId,
    pub created_at: Timestamp,
}

/// An assignment joined with its event window, returned by overlap scans.
/// Ordered by `starts_at` ascending.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConflictingAssignment {
    pub assignment_id: DbId,
    pub event_id: DbId,
    pub event_kind: String,
    pub slot_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}

impl ConflictingAssignment {
    /// The conflicting event's occupancy window.
    pub fn window(&self) -> Result<TimeWindow, ScheduleError> {
        TimeWindow::new(self.starts_at, self.ends_at)
    }
}

/// An assignment on an upcoming event, joined with everything the reminder
/// scanner needs to build a payload.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UpcomingAssignment {
    pub assignment_id: DbId,
    pub musician_id: DbId,
    pub event_id: DbId,
    pub event_kind: String,
    pub starts_at: Timestamp,
    pub location: Option<String>,
    pub instrument_name: String,
}
