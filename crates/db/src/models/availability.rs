//! Availability block model.

use serde::Serialize;
use sqlx::FromRow;

use selah_core::error::ScheduleError;
use selah_core::types::{DbId, Timestamp};
use selah_core::window::TimeWindow;

/// A row from the `availability_blocks` table: a half-open window during
/// which the musician must not be assigned. Blocks may overlap each other.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AvailabilityBlock {
    pub id: DbId,
    pub musician_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub reason: Option<String>,
    pub created_at: Timestamp,
}

impl AvailabilityBlock {
    /// The blocked window.
    pub fn window(&self) -> Result<TimeWindow, ScheduleError> {
        TimeWindow::new(self.starts_at, self.ends_at)
    }
}
