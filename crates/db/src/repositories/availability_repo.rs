//! Repository for the `availability_blocks` table.

use sqlx::PgPool;

use selah_core::types::{DbId, Timestamp};
use selah_core::window::TimeWindow;

use crate::models::availability::AvailabilityBlock;

/// Column list for `availability_blocks` queries.
const COLUMNS: &str = "id, musician_id, starts_at, ends_at, reason, created_at";

/// Provides CRUD operations for musician availability blocks.
pub struct AvailabilityRepo;

impl AvailabilityRepo {
    /// Record an unavailability window, returning the generated ID.
    /// Overlapping blocks for the same musician are allowed.
    pub async fn create(
        pool: &PgPool,
        musician_id: DbId,
        window: TimeWindow,
        reason: Option<&str>,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO availability_blocks (musician_id, starts_at, ends_at, reason) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(musician_id)
        .bind(window.start)
        .bind(window.end)
        .bind(reason)
        .fetch_one(pool)
        .await
    }

    /// All blocks for a musician from `after` onward, ordered by start.
    pub async fn list_for_musician(
        pool: &PgPool,
        musician_id: DbId,
        after: Timestamp,
    ) -> Result<Vec<AvailabilityBlock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM availability_blocks \
             WHERE musician_id = $1 AND ends_at > $2 \
             ORDER BY starts_at"
        );
        sqlx::query_as::<_, AvailabilityBlock>(&query)
            .bind(musician_id)
            .bind(after)
            .fetch_all(pool)
            .await
    }

    /// Blocks overlapping the half-open window, ordered by start.
    pub async fn overlapping(
        pool: &PgPool,
        musician_id: DbId,
        window: TimeWindow,
    ) -> Result<Vec<AvailabilityBlock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM availability_blocks \
             WHERE musician_id = $1 AND starts_at < $3 AND $2 < ends_at \
             ORDER BY starts_at"
        );
        sqlx::query_as::<_, AvailabilityBlock>(&query)
            .bind(musician_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_all(pool)
            .await
    }

    /// Same overlap scan within a caller-owned transaction.
    pub async fn overlapping_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        musician_id: DbId,
        window: TimeWindow,
    ) -> Result<Vec<AvailabilityBlock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM availability_blocks \
             WHERE musician_id = $1 AND starts_at < $3 AND $2 < ends_at \
             ORDER BY starts_at"
        );
        sqlx::query_as::<_, AvailabilityBlock>(&query)
            .bind(musician_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_all(&mut **tx)
            .await
    }

    /// Delete a block.
    pub async fn delete(pool: &PgPool, block_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM availability_blocks WHERE id = $1")
            .bind(block_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
