//! Well-known event kind constants.
//!
//! These must match the `events.kind` CHECK constraint in the schema.

use serde::{Deserialize, Serialize};

/// The two kinds of scheduled event. Conflict checks treat them uniformly:
/// a practice and a service that overlap in time still double-book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Service,
    Practice,
}

impl EventKind {
    /// The database/text representation.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Service => "service",
            EventKind::Practice => "practice",
        }
    }

    /// Parse the database/text representation.
    pub fn parse(s: &str) -> Option<EventKind> {
        match s {
            "service" => Some(EventKind::Service),
            "practice" => Some(EventKind::Practice),
            _ => None,
        }
    }

    /// Human label for notification texts.
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Service => "Sunday service",
            EventKind::Practice => "practice",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_text_round_trips() {
        for kind in [EventKind::Service, EventKind::Practice] {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::parse("rehearsal"), None);
    }
}
