//! Event and event-slot models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use selah_core::error::ScheduleError;
use selah_core::types::{DbId, Timestamp};
use selah_core::window::TimeWindow;

/// A row from the `events` table.
///
/// `kind` holds the text form of [`selah_core::calendar::EventKind`]. The
/// schema enforces `ends_at > starts_at`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub kind: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub location: Option<String>,
    pub theme: Option<String>,
    pub notes: Option<String>,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

impl Event {
    /// The event's occupancy window.
    pub fn window(&self) -> Result<TimeWindow, ScheduleError> {
        TimeWindow::new(self.starts_at, self.ends_at)
    }
}

/// DTO for creating an event.
#[derive(Debug, Deserialize)]
pub struct CreateEvent {
    pub kind: selah_core::calendar::EventKind,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub location: Option<String>,
    pub theme: Option<String>,
    pub notes: Option<String>,
    pub created_by: DbId,
}

/// A row from the `event_slots` table: one required instrument seat on an
/// event. `musician_id` is the fill cell and is NULL while the slot is open.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventSlot {
    pub id: DbId,
    pub event_id: DbId,
    pub instrument_id: DbId,
    pub role_label: Option<String>,
    pub position: i32,
    pub musician_id: Option<DbId>,
}

/// DTO for adding a slot to an event.
#[derive(Debug, Deserialize)]
pub struct CreateSlot {
    pub instrument_id: DbId,
    pub role_label: Option<String>,
    pub position: i32,
}
