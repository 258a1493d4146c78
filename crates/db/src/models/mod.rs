//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts where the insert is non-trivial
//!
//! Enum-like columns (`users.role`, `events.kind`, `notification_jobs.status`)
//! are stored as TEXT and surface here as `String`; the typed views live in
//! `selah_core` and are parsed at the boundary that needs them.

pub mod assignment;
pub mod availability;
pub mod event;
pub mod instrument;
pub mod musician;
pub mod notification_job;
pub mod song;
pub mod user;
