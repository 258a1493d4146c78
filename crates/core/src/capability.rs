//! Role capability table and the pure authorization check.
//!
//! [`authorize`] is a total function of `(Role, Action)` with no state and no
//! I/O. The same pair always yields the same [`Decision`], so it is safe to
//! call from any thread without coordination. Enforcement happens at explicit
//! call sites in the coordinator; there is no implicit or global gate.

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// The three account roles. Stored in `users.role` as snake_case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    WorshipLeader,
    Musician,
}

impl Role {
    /// The database/text representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::WorshipLeader => "worship_leader",
            Role::Musician => "musician",
        }
    }

    /// Parse the database/text representation.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "worship_leader" => Some(Role::WorshipLeader),
            "musician" => Some(Role::Musician),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A capability a role may hold, independent of any specific data instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read any schedule (every role holds this).
    ViewSchedules,
    /// Create, modify, or remove assignments, events, and slots.
    ManageAssignments,
    /// Create or edit musician profiles and their instrument sets.
    ManageMusicians,
    /// Edit the song catalog.
    ManageCatalog,
    /// Grant or revoke roles.
    ManagePermissions,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::ViewSchedules => "view_schedules",
            Action::ManageAssignments => "manage_assignments",
            Action::ManageMusicians => "manage_musicians",
            Action::ManageCatalog => "manage_catalog",
            Action::ManagePermissions => "manage_permissions",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Stable, machine-readable reason a capability check refused an action.
///
/// Consumed by the calling layer for user-facing messaging; never used as
/// control flow inside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Only admins hold this capability.
    RequiresAdmin,
    /// Worship leaders and admins hold this capability.
    RequiresLeader,
}

impl DenyReason {
    pub fn code(self) -> &'static str {
        match self {
            DenyReason::RequiresAdmin => "requires_admin",
            DenyReason::RequiresLeader => "requires_leader",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

// ---------------------------------------------------------------------------
// The capability table
// ---------------------------------------------------------------------------

/// The static capability table.
///
/// | Role          | View | Assignments | Musicians | Catalog | Permissions |
/// |---------------|------|-------------|-----------|---------|-------------|
/// | Admin         | yes  | yes         | yes       | yes     | yes         |
/// | WorshipLeader | yes  | yes         | yes       | no      | no          |
/// | Musician      | yes  | no          | no        | no      | no          |
pub fn authorize(role: Role, action: Action) -> Decision {
    use Action::*;
    use Role::*;

    match (role, action) {
        (_, ViewSchedules) => Decision::Allow,
        (Admin, _) => Decision::Allow,
        (WorshipLeader, ManageAssignments | ManageMusicians) => Decision::Allow,
        (WorshipLeader, ManageCatalog | ManagePermissions) => {
            Decision::Deny(DenyReason::RequiresAdmin)
        }
        (Musician, _) => Decision::Deny(DenyReason::RequiresLeader),
    }
}

/// [`authorize`] lifted into a `Result` for `?`-style call sites.
pub fn require(role: Role, action: Action) -> Result<(), ScheduleError> {
    match authorize(role, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(ScheduleError::Denied {
            role,
            action,
            reason,
        }),
    }
}
