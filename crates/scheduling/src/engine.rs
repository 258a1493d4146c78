//! The assignment engine: proposal validation, slot fill, removal, and
//! conflict queries.
//!
//! A proposal runs its checks and the fill inside one transaction, so a
//! committed assignment is consistent with what was validated. The slot's
//! fill cell is the arbiter under concurrency: when two proposals for the
//! same slot both pass validation, the compare-and-set admits exactly one
//! and the loser gets `SlotAlreadyFilled`.

use sqlx::PgPool;

use selah_core::error::ScheduleError;
use selah_core::types::DbId;
use selah_core::window::TimeWindow;
use selah_db::models::assignment::{Assignment, ConflictingAssignment};
use selah_db::repositories::{
    AssignmentRepo, AvailabilityRepo, EventRepo, InstrumentRepo, MusicianRepo,
};

use crate::error::SchedulingResult;

/// Outcome of a successful proposal.
#[derive(Debug, Clone)]
pub struct ProposeOutcome {
    pub assignment: Assignment,
    /// `false` when the slot was already held by the same musician and the
    /// existing assignment was returned unchanged.
    pub created: bool,
}

/// Propose assigning a musician to a slot, inside a caller-owned
/// transaction.
///
/// Checks run in order: the slot must exist on the named event; a re-proposal
/// of the current holder short-circuits to the existing assignment; the
/// musician must exist and play the slot's instrument; no availability block
/// and no other assignment may overlap the event window (half-open, boundary
/// equality is not a conflict, services and practices compete uniformly).
/// Only then is the fill cell claimed and the assignment inserted.
pub async fn propose_in_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    musician_id: DbId,
    event_id: DbId,
    slot_id: DbId,
    assigned_by: DbId,
) -> SchedulingResult<ProposeOutcome> {
    let slot = EventRepo::slot_in_tx(tx, slot_id).await?.ok_or(
        ScheduleError::NotFound {
            entity: "slot",
            id: slot_id,
        },
    )?;
    if slot.event_id != event_id {
        return Err(ScheduleError::SlotMismatch { slot_id, event_id }.into());
    }
    let event = EventRepo::get_in_tx(tx, event_id).await?.ok_or(
        ScheduleError::NotFound {
            entity: "event",
            id: event_id,
        },
    )?;

    // Idempotent refill: the current holder re-proposed for their own slot.
    if slot.musician_id == Some(musician_id) {
        if let Some(existing) = AssignmentRepo::get_by_slot_in_tx(tx, slot_id).await? {
            return Ok(ProposeOutcome {
                assignment: existing,
                created: false,
            });
        }
    }

    if MusicianRepo::get_in_tx(tx, musician_id).await?.is_none() {
        return Err(ScheduleError::NotFound {
            entity: "musician",
            id: musician_id,
        }
        .into());
    }

    if !MusicianRepo::plays_in_tx(tx, musician_id, slot.instrument_id).await? {
        let instrument = InstrumentRepo::get_in_tx(tx, slot.instrument_id)
            .await?
            .map(|i| i.name)
            .unwrap_or_else(|| format!("instrument #{}", slot.instrument_id));
        return Err(ScheduleError::CapabilityMismatch {
            musician_id,
            instrument,
        }
        .into());
    }

    let window = event.window()?;

    if let Some(block) = AvailabilityRepo::overlapping_in_tx(tx, musician_id, window)
        .await?
        .into_iter()
        .next()
    {
        return Err(ScheduleError::AvailabilityConflict {
            musician_id,
            block_id: block.id,
            window: block.window()?,
        }
        .into());
    }

    if let Some(conflict) = AssignmentRepo::overlapping_in_tx(tx, musician_id, window)
        .await?
        .into_iter()
        .next()
    {
        return Err(ScheduleError::DoubleBooking {
            musician_id,
            assignment_id: conflict.assignment_id,
            window: conflict.window()?,
        }
        .into());
    }

    // The fill cell is the arbiter: under concurrency the losing transaction
    // blocks here until the winner commits, then sees the filled cell.
    if !AssignmentRepo::claim_slot(tx, slot_id, musician_id).await? {
        return Err(ScheduleError::SlotAlreadyFilled { slot_id }.into());
    }
    let assignment =
        AssignmentRepo::create_in_tx(tx, slot_id, event_id, musician_id, assigned_by).await?;
    tracing::info!(
        assignment_id = assignment.id,
        musician_id,
        event_id,
        slot_id,
        "assignment created"
    );
    Ok(ProposeOutcome {
        assignment,
        created: true,
    })
}

/// Remove an assignment and free its slot, inside a caller-owned
/// transaction.
///
/// Returns the removed record, or `None` when no such assignment existed
/// (removal is an idempotent no-op).
pub async fn remove_in_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    assignment_id: DbId,
) -> SchedulingResult<Option<Assignment>> {
    let Some(assignment) = AssignmentRepo::get_in_tx(tx, assignment_id).await? else {
        return Ok(None);
    };
    AssignmentRepo::delete_in_tx(tx, assignment_id).await?;
    AssignmentRepo::clear_slot(tx, assignment.slot_id, assignment.musician_id).await?;
    tracing::info!(
        assignment_id,
        slot_id = assignment.slot_id,
        musician_id = assignment.musician_id,
        "assignment removed"
    );
    Ok(Some(assignment))
}

/// Propose an assignment in its own transaction.
pub async fn propose_assignment(
    pool: &PgPool,
    musician_id: DbId,
    event_id: DbId,
    slot_id: DbId,
    assigned_by: DbId,
) -> SchedulingResult<ProposeOutcome> {
    let mut tx = pool.begin().await?;
    let outcome = propose_in_tx(&mut tx, musician_id, event_id, slot_id, assigned_by).await?;
    tx.commit().await?;
    Ok(outcome)
}

/// Remove an assignment in its own transaction.
///
/// Returns `true` if an assignment was removed, `false` for the no-op case.
pub async fn remove_assignment(pool: &PgPool, assignment_id: DbId) -> SchedulingResult<bool> {
    let mut tx = pool.begin().await?;
    let removed = remove_in_tx(&mut tx, assignment_id).await?;
    tx.commit().await?;
    Ok(removed.is_some())
}

/// The musician's assignments overlapping the window, ordered by event start
/// ascending. Read-only; results reflect the schedule at call time.
pub async fn find_conflicts(
    pool: &PgPool,
    musician_id: DbId,
    window: TimeWindow,
) -> SchedulingResult<Vec<ConflictingAssignment>> {
    Ok(AssignmentRepo::overlapping(pool, musician_id, window).await?)
}
