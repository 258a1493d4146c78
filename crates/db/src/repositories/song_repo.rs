//! Repository for the `songs` catalog.

use sqlx::PgPool;

use selah_core::types::DbId;

use crate::models::song::{CreateSong, Song};

/// Column list for `songs` queries.
const COLUMNS: &str = "id, title, artist, song_key, created_by, created_at";

/// Provides CRUD operations for the song catalog.
pub struct SongRepo;

impl SongRepo {
    /// Create a song, returning the generated ID.
    pub async fn create(pool: &PgPool, create: &CreateSong) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO songs (title, artist, song_key, created_by) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(&create.title)
        .bind(&create.artist)
        .bind(&create.song_key)
        .bind(create.created_by)
        .fetch_one(pool)
        .await
    }

    /// Fetch a song by ID.
    pub async fn get(pool: &PgPool, song_id: DbId) -> Result<Option<Song>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM songs WHERE id = $1");
        sqlx::query_as::<_, Song>(&query)
            .bind(song_id)
            .fetch_optional(pool)
            .await
    }

    /// List the catalog ordered by title.
    pub async fn list(pool: &PgPool) -> Result<Vec<Song>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM songs ORDER BY title");
        sqlx::query_as::<_, Song>(&query).fetch_all(pool).await
    }

    /// Update a song's key.
    pub async fn set_key(
        pool: &PgPool,
        song_id: DbId,
        song_key: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE songs SET song_key = $2 WHERE id = $1")
            .bind(song_id)
            .bind(song_key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a song.
    pub async fn delete(pool: &PgPool, song_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM songs WHERE id = $1")
            .bind(song_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
