//! Scheduling library: the assignment engine and the coordinator that a web
//! layer embeds.
//!
//! The engine validates and applies single assignments; the coordinator
//! sequences authorize -> mutate -> notify so that a committed mutation and
//! its notification job always land together.

pub mod coordinator;
pub mod engine;
pub mod error;

pub use coordinator::{Actor, Coordinator};
pub use error::{ErrorKind, SchedulingError, SchedulingResult};
