//! The coordinator: authorize -> mutate -> notify as one unit.
//!
//! Every intent follows the same sequence: check the actor's capability, run
//! the engine mutation, and enqueue the resulting notification jobs in the
//! same transaction. A denial or engine error therefore leaves no trace, and
//! a committed mutation always has its notification jobs alongside it.

use sqlx::PgPool;

use selah_core::calendar::EventKind;
use selah_core::capability::{self, Action, Role};
use selah_core::error::ScheduleError;
use selah_core::notify::{NotificationKind, NotificationPayload};
use selah_core::types::DbId;
use selah_core::window::TimeWindow;
use selah_db::models::assignment::{Assignment, ConflictingAssignment};
use selah_db::models::event::Event;
use selah_db::repositories::{
    AssignmentRepo, AvailabilityRepo, EventRepo, InstrumentRepo, MusicianRepo,
    NotificationJobRepo,
};

use crate::engine;
use crate::error::SchedulingResult;

/// The authenticated caller of an intent. Authentication itself happens in
/// the embedding layer; the coordinator trusts the resolved role.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: DbId,
    pub role: Role,
}

/// Entry point a web layer embeds. Cheap to clone; holds only the pool.
#[derive(Clone)]
pub struct Coordinator {
    pool: PgPool,
}

impl Coordinator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Assign a musician to a slot and queue an `assignment_created`
    /// notification for them.
    ///
    /// An idempotent re-proposal (the musician already holds the slot)
    /// returns the existing assignment and queues nothing.
    pub async fn assign_musician(
        &self,
        actor: Actor,
        musician_id: DbId,
        event_id: DbId,
        slot_id: DbId,
    ) -> SchedulingResult<Assignment> {
        Self::authorize(actor, Action::ManageAssignments)?;

        let mut tx = self.pool.begin().await?;
        let outcome =
            engine::propose_in_tx(&mut tx, musician_id, event_id, slot_id, actor.user_id).await?;
        if outcome.created {
            let payload = Self::slot_payload(
                &mut tx,
                NotificationKind::AssignmentCreated,
                event_id,
                outcome.assignment.slot_id,
            )
            .await?;
            let job_id = NotificationJobRepo::enqueue_in_tx(&mut tx, musician_id, &payload).await?;
            tracing::debug!(job_id, musician_id, "notification queued");
        }
        tx.commit().await?;
        Ok(outcome.assignment)
    }

    /// Remove an assignment, free its slot, and queue an
    /// `assignment_removed` notification for the musician who held it.
    ///
    /// Removing a non-existent assignment is a no-op returning `false`.
    pub async fn unassign_musician(
        &self,
        actor: Actor,
        assignment_id: DbId,
    ) -> SchedulingResult<bool> {
        Self::authorize(actor, Action::ManageAssignments)?;

        let mut tx = self.pool.begin().await?;
        let removed = engine::remove_in_tx(&mut tx, assignment_id).await?;
        if let Some(assignment) = &removed {
            let payload = Self::slot_payload(
                &mut tx,
                NotificationKind::AssignmentRemoved,
                assignment.event_id,
                assignment.slot_id,
            )
            .await?;
            NotificationJobRepo::enqueue_in_tx(&mut tx, assignment.musician_id, &payload).await?;
        }
        tx.commit().await?;
        Ok(removed.is_some())
    }

    /// The musician's assignments overlapping the window, ordered by event
    /// start. Read-only; queues nothing.
    pub async fn preview_conflicts(
        &self,
        actor: Actor,
        musician_id: DbId,
        window: TimeWindow,
    ) -> SchedulingResult<Vec<ConflictingAssignment>> {
        Self::authorize(actor, Action::ViewSchedules)?;
        engine::find_conflicts(&self.pool, musician_id, window).await
    }

    /// Cancel an event: delete it (slots and assignments cascade) and queue
    /// an `event_cancelled` notification for every assigned musician.
    ///
    /// Cancelling a non-existent event is a no-op returning `false`.
    pub async fn cancel_event(&self, actor: Actor, event_id: DbId) -> SchedulingResult<bool> {
        Self::authorize(actor, Action::ManageAssignments)?;

        let mut tx = self.pool.begin().await?;
        let Some(event) = EventRepo::get_in_tx(&mut tx, event_id).await? else {
            return Ok(false);
        };
        let affected = AssignmentRepo::for_event_in_tx(&mut tx, event_id).await?;
        let payload = Self::event_payload(NotificationKind::EventCancelled, &event, None)?;
        for assignment in &affected {
            NotificationJobRepo::enqueue_in_tx(&mut tx, assignment.musician_id, &payload).await?;
        }
        EventRepo::delete_in_tx(&mut tx, event_id).await?;
        tx.commit().await?;
        tracing::info!(
            event_id,
            notified = affected.len(),
            "event cancelled"
        );
        Ok(true)
    }

    /// Record an unavailability window for a musician.
    ///
    /// Musicians may declare their own; anyone else's requires the
    /// `manage_musicians` capability.
    pub async fn declare_unavailable(
        &self,
        actor: Actor,
        musician_id: DbId,
        window: TimeWindow,
        reason: Option<&str>,
    ) -> SchedulingResult<DbId> {
        let own_profile = MusicianRepo::get_by_user(&self.pool, actor.user_id)
            .await?
            .is_some_and(|m| m.id == musician_id);
        if !own_profile {
            Self::authorize(actor, Action::ManageMusicians)?;
        }

        if MusicianRepo::get(&self.pool, musician_id).await?.is_none() {
            return Err(ScheduleError::NotFound {
                entity: "musician",
                id: musician_id,
            }
            .into());
        }
        let block_id = AvailabilityRepo::create(&self.pool, musician_id, window, reason).await?;
        tracing::info!(musician_id, block_id, %window, "unavailability recorded");
        Ok(block_id)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Capability check with an audit log line on denial.
    fn authorize(actor: Actor, action: Action) -> Result<(), ScheduleError> {
        let decision = capability::require(actor.role, action);
        if decision.is_err() {
            tracing::warn!(
                user_id = actor.user_id,
                role = %actor.role,
                action = %action,
                "capability denied"
            );
        }
        decision
    }

    /// Build a payload for a slot-scoped notification, resolving the event
    /// and the slot's instrument inside the caller's transaction.
    async fn slot_payload(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        kind: NotificationKind,
        event_id: DbId,
        slot_id: DbId,
    ) -> SchedulingResult<NotificationPayload> {
        let event = EventRepo::get_in_tx(tx, event_id).await?.ok_or(
            ScheduleError::NotFound {
                entity: "event",
                id: event_id,
            },
        )?;
        let instrument = match EventRepo::slot_in_tx(tx, slot_id).await? {
            Some(slot) => InstrumentRepo::get_in_tx(tx, slot.instrument_id)
                .await?
                .map(|i| i.name),
            None => None,
        };
        Self::event_payload(kind, &event, instrument)
    }

    /// Build a payload from an event row.
    fn event_payload(
        kind: NotificationKind,
        event: &Event,
        instrument: Option<String>,
    ) -> SchedulingResult<NotificationPayload> {
        let event_kind = EventKind::parse(&event.kind).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown event kind {:?}", event.kind).into())
        })?;
        Ok(NotificationPayload {
            kind,
            event_id: event.id,
            event_kind,
            event_starts_at: event.starts_at,
            event_location: event.location.clone(),
            instrument,
            note: None,
        })
    }
}
