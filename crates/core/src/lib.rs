//! Pure domain logic for the Selah scheduling core.
//!
//! This crate has zero internal dependencies and no database access so it can
//! be used by the scheduling library, the notifier worker, and any future CLI
//! tooling. Everything here is synchronous and side-effect free.

pub mod backoff;
pub mod calendar;
pub mod capability;
pub mod error;
pub mod notify;
pub mod phone;
pub mod types;
pub mod window;
