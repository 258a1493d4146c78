//! Repository for the `events` and `event_slots` tables.

use sqlx::PgPool;

use selah_core::types::DbId;
use selah_core::window::TimeWindow;

use crate::models::event::{CreateEvent, CreateSlot, Event, EventSlot};

/// Column list for `events` queries.
const COLUMNS: &str =
    "id, kind, starts_at, ends_at, location, theme, notes, created_by, created_at";

/// Column list for `event_slots` queries.
const SLOT_COLUMNS: &str = "id, event_id, instrument_id, role_label, position, musician_id";

/// Provides CRUD operations for events and their instrument slots.
pub struct EventRepo;

impl EventRepo {
    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Create an event, returning the generated ID. The schema rejects
    /// windows with `ends_at <= starts_at`.
    pub async fn create(pool: &PgPool, create: &CreateEvent) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO events (kind, starts_at, ends_at, location, theme, notes, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(create.kind.as_str())
        .bind(create.starts_at)
        .bind(create.ends_at)
        .bind(&create.location)
        .bind(&create.theme)
        .bind(&create.notes)
        .bind(create.created_by)
        .fetch_one(pool)
        .await
    }

    /// Fetch an event by ID.
    pub async fn get(pool: &PgPool, event_id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(event_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch an event by ID within a caller-owned transaction.
    pub async fn get_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event_id: DbId,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(event_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Events whose occupancy window overlaps the given half-open window,
    /// ordered by start ascending.
    pub async fn overlapping(
        pool: &PgPool,
        window: TimeWindow,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events \
             WHERE starts_at < $2 AND $1 < ends_at \
             ORDER BY starts_at"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(window.start)
            .bind(window.end)
            .fetch_all(pool)
            .await
    }

    /// Delete an event within a caller-owned transaction. Slots and
    /// assignments go with it (FK cascade).
    ///
    /// Returns `true` if the event existed.
    pub async fn delete_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Slots
    // -----------------------------------------------------------------------

    /// Add a required instrument slot to an event, returning the generated
    /// ID. `position` must be unique within the event.
    pub async fn add_slot(
        pool: &PgPool,
        event_id: DbId,
        create: &CreateSlot,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO event_slots (event_id, instrument_id, role_label, position) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(event_id)
        .bind(create.instrument_id)
        .bind(&create.role_label)
        .bind(create.position)
        .fetch_one(pool)
        .await
    }

    /// Fetch a slot by ID.
    pub async fn slot(pool: &PgPool, slot_id: DbId) -> Result<Option<EventSlot>, sqlx::Error> {
        let query = format!("SELECT {SLOT_COLUMNS} FROM event_slots WHERE id = $1");
        sqlx::query_as::<_, EventSlot>(&query)
            .bind(slot_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a slot by ID within a caller-owned transaction.
    pub async fn slot_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        slot_id: DbId,
    ) -> Result<Option<EventSlot>, sqlx::Error> {
        let query = format!("SELECT {SLOT_COLUMNS} FROM event_slots WHERE id = $1");
        sqlx::query_as::<_, EventSlot>(&query)
            .bind(slot_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// The ordered slot set of an event.
    pub async fn slots(pool: &PgPool, event_id: DbId) -> Result<Vec<EventSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {SLOT_COLUMNS} FROM event_slots \
             WHERE event_id = $1 \
             ORDER BY position"
        );
        sqlx::query_as::<_, EventSlot>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }
}
