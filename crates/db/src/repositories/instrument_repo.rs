//! Repository for the `instruments` catalog (read-only; seeded by migration).

use sqlx::PgPool;

use selah_core::types::DbId;

use crate::models::instrument::Instrument;

/// Provides read access to the instrument catalog.
pub struct InstrumentRepo;

impl InstrumentRepo {
    /// Fetch an instrument by ID.
    pub async fn get(pool: &PgPool, instrument_id: DbId) -> Result<Option<Instrument>, sqlx::Error> {
        sqlx::query_as::<_, Instrument>("SELECT id, name FROM instruments WHERE id = $1")
            .bind(instrument_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch an instrument by ID within a caller-owned transaction.
    pub async fn get_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        instrument_id: DbId,
    ) -> Result<Option<Instrument>, sqlx::Error> {
        sqlx::query_as::<_, Instrument>("SELECT id, name FROM instruments WHERE id = $1")
            .bind(instrument_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Fetch an instrument by its unique name.
    pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Option<Instrument>, sqlx::Error> {
        sqlx::query_as::<_, Instrument>("SELECT id, name FROM instruments WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List the whole catalog ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Instrument>, sqlx::Error> {
        sqlx::query_as::<_, Instrument>("SELECT id, name FROM instruments ORDER BY name")
            .fetch_all(pool)
            .await
    }
}
