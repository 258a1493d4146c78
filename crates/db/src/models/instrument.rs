//! Instrument catalog model.

use serde::Serialize;
use sqlx::FromRow;

use selah_core::types::DbId;

/// A row from the `instruments` table. The catalog is seeded by migration
/// and immutable at runtime.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Instrument {
    pub id: DbId,
    pub name: String,
}
