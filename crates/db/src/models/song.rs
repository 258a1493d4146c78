//! Song catalog models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use selah_core::types::{DbId, Timestamp};

/// A row from the `songs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Song {
    pub id: DbId,
    pub title: String,
    pub artist: Option<String>,
    /// Musical key, e.g. 'G' or 'Am'.
    pub song_key: Option<String>,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// DTO for creating a song.
#[derive(Debug, Deserialize)]
pub struct CreateSong {
    pub title: String,
    pub artist: Option<String>,
    pub song_key: Option<String>,
    pub created_by: DbId,
}
