//! Repository for the `musicians` and `musician_instruments` tables.

use sqlx::PgPool;

use selah_core::types::DbId;

use crate::models::musician::{CreateMusician, Musician, MusicianSkill};

/// Column list for `musicians` queries.
const COLUMNS: &str = "id, user_id, name, mobile_number, bio, created_at";

/// Provides CRUD operations for musician profiles and their instrument sets.
pub struct MusicianRepo;

impl MusicianRepo {
    // -----------------------------------------------------------------------
    // Profiles
    // -----------------------------------------------------------------------

    /// Create a musician profile, returning the generated ID.
    pub async fn create(pool: &PgPool, create: &CreateMusician) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO musicians (user_id, name, mobile_number, bio) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(create.user_id)
        .bind(&create.name)
        .bind(&create.mobile_number)
        .bind(&create.bio)
        .fetch_one(pool)
        .await
    }

    /// Fetch a musician by ID.
    pub async fn get(pool: &PgPool, musician_id: DbId) -> Result<Option<Musician>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM musicians WHERE id = $1");
        sqlx::query_as::<_, Musician>(&query)
            .bind(musician_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a musician by ID within a caller-owned transaction.
    pub async fn get_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        musician_id: DbId,
    ) -> Result<Option<Musician>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM musicians WHERE id = $1");
        sqlx::query_as::<_, Musician>(&query)
            .bind(musician_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Fetch the musician profile owned by a user, if any.
    pub async fn get_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Musician>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM musicians WHERE user_id = $1");
        sqlx::query_as::<_, Musician>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List all musicians ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Musician>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM musicians ORDER BY name");
        sqlx::query_as::<_, Musician>(&query).fetch_all(pool).await
    }

    /// Update a musician's mobile number (`None` clears it).
    ///
    /// Returns `true` if the musician existed and was updated.
    pub async fn update_contact(
        pool: &PgPool,
        musician_id: DbId,
        mobile_number: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE musicians SET mobile_number = $2 WHERE id = $1")
            .bind(musician_id)
            .bind(mobile_number)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a musician profile.
    ///
    /// Fails with a foreign-key error while the musician still holds
    /// assignments or filled slots; unassign first.
    pub async fn delete(pool: &PgPool, musician_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM musicians WHERE id = $1")
            .bind(musician_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Instrument set
    // -----------------------------------------------------------------------

    /// Add an instrument to a musician's set, or update its proficiency if
    /// already present. Proficiency is 1..=5 (checked by the schema).
    pub async fn set_instrument(
        pool: &PgPool,
        musician_id: DbId,
        instrument_id: DbId,
        proficiency: i16,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO musician_instruments (musician_id, instrument_id, proficiency) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (musician_id, instrument_id) \
             DO UPDATE SET proficiency = EXCLUDED.proficiency",
        )
        .bind(musician_id)
        .bind(instrument_id)
        .bind(proficiency)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Remove an instrument from a musician's set.
    pub async fn remove_instrument(
        pool: &PgPool,
        musician_id: DbId,
        instrument_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM musician_instruments \
             WHERE musician_id = $1 AND instrument_id = $2",
        )
        .bind(musician_id)
        .bind(instrument_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The musician's instrument set joined with the catalog, ordered by
    /// instrument name.
    pub async fn skills(
        pool: &PgPool,
        musician_id: DbId,
    ) -> Result<Vec<MusicianSkill>, sqlx::Error> {
        sqlx::query_as::<_, MusicianSkill>(
            "SELECT mi.instrument_id, i.name AS instrument_name, mi.proficiency \
             FROM musician_instruments mi \
             JOIN instruments i ON i.id = mi.instrument_id \
             WHERE mi.musician_id = $1 \
             ORDER BY i.name",
        )
        .bind(musician_id)
        .fetch_all(pool)
        .await
    }

    /// Whether the musician's set contains the instrument, at any
    /// proficiency.
    pub async fn plays(
        pool: &PgPool,
        musician_id: DbId,
        instrument_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS( \
                 SELECT 1 FROM musician_instruments \
                 WHERE musician_id = $1 AND instrument_id = $2)",
        )
        .bind(musician_id)
        .bind(instrument_id)
        .fetch_one(pool)
        .await
    }

    /// Same capability check within a caller-owned transaction.
    pub async fn plays_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        musician_id: DbId,
        instrument_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS( \
                 SELECT 1 FROM musician_instruments \
                 WHERE musician_id = $1 AND instrument_id = $2)",
        )
        .bind(musician_id)
        .bind(instrument_id)
        .fetch_one(&mut **tx)
        .await
    }
}
