//! Musician directory models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use selah_core::types::{DbId, Timestamp};

/// A row from the `musicians` table. Each musician profile belongs to
/// exactly one user account.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Musician {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    /// E.164-normalized, or `None` when the musician is unreachable by SMS.
    pub mobile_number: Option<String>,
    pub bio: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a musician profile.
#[derive(Debug, Deserialize)]
pub struct CreateMusician {
    pub user_id: DbId,
    pub name: String,
    pub mobile_number: Option<String>,
    pub bio: Option<String>,
}

/// One entry of a musician's instrument set, joined with the catalog.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MusicianSkill {
    pub instrument_id: DbId,
    pub instrument_name: String,
    /// 1 (beginner) to 5 (expert). Order of the set is irrelevant.
    pub proficiency: i16,
}
