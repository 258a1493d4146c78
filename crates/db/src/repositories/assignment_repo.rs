//! Repository for the `assignments` table and the slot fill cell.
//!
//! Filling a slot is a compare-and-set on `event_slots.musician_id` against
//! NULL followed by the assignment insert, both inside the caller's
//! transaction. Under concurrent proposals for one slot the CAS admits
//! exactly one winner.

use sqlx::PgPool;

use selah_core::types::{DbId, Timestamp};
use selah_core::window::TimeWindow;

use crate::models::assignment::{Assignment, ConflictingAssignment, UpcomingAssignment};

/// Column list for `assignments` queries.
const COLUMNS: &str = "id, slot_id, event_id, musician_id, assigned_by, created_at";

/// Overlap scan: assignments joined with their event windows.
const CONFLICT_SQL: &str = "SELECT a.id AS assignment_id, a.event_id, e.kind AS event_kind, \
            a.slot_id, e.starts_at, e.ends_at \
     FROM assignments a \
     JOIN events e ON e.id = a.event_id \
     WHERE a.musician_id = $1 AND e.starts_at < $3 AND $2 < e.ends_at \
     ORDER BY e.starts_at, a.id";

/// Provides assignment records and slot fill/release operations.
pub struct AssignmentRepo;

impl AssignmentRepo {
    // -----------------------------------------------------------------------
    // Slot fill cell
    // -----------------------------------------------------------------------

    /// Compare-and-set the slot's fill cell from NULL to `musician_id`.
    ///
    /// Returns `false` when the slot was already filled (by anyone); the
    /// caller maps that to its conflict error.
    pub async fn claim_slot(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        slot_id: DbId,
        musician_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE event_slots SET musician_id = $2 \
             WHERE id = $1 AND musician_id IS NULL",
        )
        .bind(slot_id)
        .bind(musician_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Release the slot's fill cell, guarded by the current occupant.
    pub async fn clear_slot(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        slot_id: DbId,
        musician_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE event_slots SET musician_id = NULL \
             WHERE id = $1 AND musician_id = $2",
        )
        .bind(slot_id)
        .bind(musician_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Assignment records
    // -----------------------------------------------------------------------

    /// Insert the assignment record for a freshly claimed slot, returning
    /// the full row.
    pub async fn create_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        slot_id: DbId,
        event_id: DbId,
        musician_id: DbId,
        assigned_by: DbId,
    ) -> Result<Assignment, sqlx::Error> {
        let query = format!(
            "INSERT INTO assignments (slot_id, event_id, musician_id, assigned_by) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(slot_id)
            .bind(event_id)
            .bind(musician_id)
            .bind(assigned_by)
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch an assignment by ID.
    pub async fn get(
        pool: &PgPool,
        assignment_id: DbId,
    ) -> Result<Option<Assignment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assignments WHERE id = $1");
        sqlx::query_as::<_, Assignment>(&query)
            .bind(assignment_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch an assignment by ID within a caller-owned transaction.
    pub async fn get_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        assignment_id: DbId,
    ) -> Result<Option<Assignment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assignments WHERE id = $1");
        sqlx::query_as::<_, Assignment>(&query)
            .bind(assignment_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Fetch the assignment occupying a slot, if any.
    pub async fn get_by_slot_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        slot_id: DbId,
    ) -> Result<Option<Assignment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assignments WHERE slot_id = $1");
        sqlx::query_as::<_, Assignment>(&query)
            .bind(slot_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Delete an assignment record.
    pub async fn delete_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        assignment_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(assignment_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All assignments on an event, within a caller-owned transaction.
    /// Used by event cancellation to collect the affected musicians.
    pub async fn for_event_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event_id: DbId,
    ) -> Result<Vec<Assignment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assignments WHERE event_id = $1 ORDER BY id");
        sqlx::query_as::<_, Assignment>(&query)
            .bind(event_id)
            .fetch_all(&mut **tx)
            .await
    }

    // -----------------------------------------------------------------------
    // Scans
    // -----------------------------------------------------------------------

    /// The musician's assignments whose event windows overlap the half-open
    /// window, ordered by event start ascending.
    pub async fn overlapping(
        pool: &PgPool,
        musician_id: DbId,
        window: TimeWindow,
    ) -> Result<Vec<ConflictingAssignment>, sqlx::Error> {
        sqlx::query_as::<_, ConflictingAssignment>(CONFLICT_SQL)
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
    ) -> Result<Vec<ConflictingAssignment>, sqlx::Error> {
        sqlx::query_as::<_, ConflictingAssignment>(CONFLICT_SQL)
            .bind(musician_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_all(&mut **tx)
            .await
    }

    /// Assignments on events starting within `[from, until)`, joined with
    /// what the reminder scanner needs. Ordered by event start.
    pub async fn upcoming(
        pool: &PgPool,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<UpcomingAssignment>, sqlx::Error> {
        sqlx::query_as::<_, UpcomingAssignment>(
            "SELECT a.id AS assignment_id, a.musician_id, a.event_id, \
                    e.kind AS event_kind, e.starts_at, e.location, \
                    i.name AS instrument_name \
             FROM assignments a \
             JOIN events e ON e.id = a.event_id \
             JOIN event_slots s ON s.id = a.slot_id \
             JOIN instruments i ON i.id = s.instrument_id \
             WHERE e.starts_at >= $1 AND e.starts_at < $2 \
             ORDER BY e.starts_at, a.id",
        )
        .bind(from)
        .bind(until)
        .fetch_all(pool)
        .await
    }
}
