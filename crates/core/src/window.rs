//! Half-open time windows and interval overlap checks.
//!
//! Every window in the system (event duration, availability block, conflict
//! query range) is a half-open UTC interval `[start, end)`. Two windows
//! conflict when they genuinely share time; touching at a boundary (one ends
//! exactly when the other starts) is not a conflict, so back-to-back events
//! can share a musician.

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::types::Timestamp;

/// A half-open UTC time range `[start, end)` with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeWindow {
    /// Build a window, rejecting empty or inverted ranges.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, ScheduleError> {
        if end <= start {
            return Err(ScheduleError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Half-open overlap test: `self.start < other.end && other.start < self.end`.
    ///
    /// Boundary equality is NOT an overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether a point in time falls inside the window (`start` inclusive,
    /// `end` exclusive).
    pub fn contains(&self, at: Timestamp) -> bool {
        self.start <= at && at < self.end
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(hour: u32, min: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, min, 0).unwrap()
    }

    fn window(h1: u32, m1: u32, h2: u32, m2: u32) -> TimeWindow {
        TimeWindow::new(at(h1, m1), at(h2, m2)).unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(TimeWindow::new(at(11, 0), at(10, 0)).is_err());
    }

    #[test]
    fn rejects_empty_range() {
        assert!(TimeWindow::new(at(10, 0), at(10, 0)).is_err());
    }

    #[test]
    fn partial_overlap_detected() {
        // Service 10:00-11:30 vs block 11:00-12:00.
        let service = window(10, 0, 11, 30);
        let block = window(11, 0, 12, 0);
        assert!(service.overlaps(&block));
        assert!(block.overlaps(&service));
    }

    #[test]
    fn containment_is_overlap() {
        let outer = window(9, 0, 13, 0);
        let inner = window(10, 0, 11, 0);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn identical_windows_overlap() {
        let a = window(10, 0, 11, 0);
        assert!(a.overlaps(&a));
    }

    #[test]
    fn disjoint_windows_do_not_overlap() {
        let morning = window(8, 0, 9, 0);
        let evening = window(18, 0, 19, 0);
        assert!(!morning.overlaps(&evening));
        assert!(!evening.overlaps(&morning));
    }

    #[test]
    fn boundary_touch_is_not_overlap() {
        // First ends exactly when the second starts.
        let first = window(10, 0, 11, 0);
        let second = window(11, 0, 12, 0);
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn contains_is_half_open() {
        let w = window(10, 0, 11, 0);
        assert!(w.contains(at(10, 0)));
        assert!(w.contains(at(10, 30)));
        assert!(!w.contains(at(11, 0)));
    }
}
