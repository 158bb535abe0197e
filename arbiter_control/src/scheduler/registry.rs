//! Subsystem registry: exclusive mechanism ownership.
//!
//! Every registered mechanism has exactly one holder at any time, either
//! its default routine or one explicit routine. Claims are all-or-nothing:
//! either every requirement is granted or nothing changes.
//!
//! ## Claim protocol
//!
//! 1. Reject if any requirement is unregistered.
//! 2. Reject with `OwnershipConflict` if any current explicit holder is
//!    `CancelIncoming`.
//! 3. Stop displaced defaults (`Interrupted`).
//! 4. Stop displaced explicit routines (`Interrupted`) and hand their
//!    other mechanisms back to the defaults.
//! 5. Record the new holder and run its `on_start`.

use heapless::Vec as HVec;
use tracing::{debug, warn};

use arbiter_common::consts::{MAX_MECHANISMS, MAX_REQUIREMENTS};
use arbiter_common::sched::error::{RoutineError, SchedulerError};
use arbiter_common::sched::state::{
    InterruptBehavior, MechanismId, RoutineId, RoutineState, StopReason,
};

use crate::routine::context::TickIo;
use crate::routine::lifecycle::{Outcome, Requirements, Routine};

/// Current holder of a mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holder {
    /// The mechanism's default routine.
    Default,
    /// An explicit routine.
    Routine(RoutineId),
}

/// Result of a successful claim.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// Requirements granted, routine running.
    Started,
    /// Routine was already scheduled; nothing changed.
    AlreadyScheduled,
    /// Routine completed inside `on_start`; mechanisms already returned.
    Completed,
    /// `on_start` failed; mechanisms already returned.
    Faulted(RoutineError),
}

#[derive(Debug)]
struct MechanismSlot {
    name: &'static str,
    default: Routine,
    holder: Holder,
}

/// Mechanism slots indexed by [`MechanismId`].
#[derive(Debug)]
pub struct SubsystemRegistry {
    slots: [Option<MechanismSlot>; MAX_MECHANISMS],
}

impl Default for SubsystemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubsystemRegistry {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Register a mechanism together with its default routine.
    ///
    /// The default must require exactly this mechanism.
    pub fn register(
        &mut self,
        id: MechanismId,
        name: &'static str,
        default: Routine,
    ) -> Result<(), SchedulerError> {
        let slot = self
            .slots
            .get_mut(id.index())
            .ok_or(SchedulerError::CapacityExceeded("mechanisms"))?;
        if slot.is_some() {
            return Err(SchedulerError::DuplicateMechanism(id));
        }
        if default.requirements() != [id].as_slice() {
            return Err(SchedulerError::DefaultRequirementMismatch {
                routine: default.name(),
                mechanism: id,
            });
        }
        *slot = Some(MechanismSlot {
            name,
            default,
            holder: Holder::Default,
        });
        debug!(mechanism = %id, name, "mechanism registered");
        Ok(())
    }

    #[inline]
    fn slot(&self, id: MechanismId) -> Option<&MechanismSlot> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    #[inline]
    fn slot_mut(&mut self, id: MechanismId) -> Option<&mut MechanismSlot> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: MechanismId) -> bool {
        self.slot(id).is_some()
    }

    /// Registered mechanism ids in ascending order.
    pub fn mechanisms(&self) -> impl Iterator<Item = MechanismId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| MechanismId(i as u8))
    }

    pub fn len(&self) -> usize {
        self.mechanisms().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name(&self, id: MechanismId) -> Option<&'static str> {
        self.slot(id).map(|s| s.name)
    }

    pub fn holder(&self, id: MechanismId) -> Option<Holder> {
        self.slot(id).map(|s| s.holder)
    }

    /// True when explicit routine `routine` currently holds `id`.
    pub fn is_held_by(&self, id: MechanismId, routine: RoutineId) -> bool {
        self.holder(id) == Some(Holder::Routine(routine))
    }

    pub fn default_routine(&self, id: MechanismId) -> Option<&Routine> {
        self.slot(id).map(|s| &s.default)
    }

    // ─── Claim / release ────────────────────────────────────────────

    /// Grant all of routine `id`'s requirements and start it.
    pub fn claim(
        &mut self,
        id: RoutineId,
        routines: &mut [Routine],
        io: &mut TickIo<'_>,
    ) -> Result<ClaimOutcome, SchedulerError> {
        let routine = routines
            .get(id.index())
            .ok_or(SchedulerError::UnknownRoutine(id))?;
        if routine.is_scheduled() {
            return Ok(ClaimOutcome::AlreadyScheduled);
        }

        // Validation pass: nothing changes unless every requirement is grantable.
        for &m in routine.requirements() {
            let slot = self.slot(m).ok_or(SchedulerError::UnboundMechanism {
                routine: routine.name(),
                mechanism: m,
            })?;
            if let Holder::Routine(h) = slot.holder {
                let holder = &routines[h.index()];
                if holder.interrupt() == InterruptBehavior::CancelIncoming {
                    return Err(SchedulerError::OwnershipConflict {
                        mechanism: m,
                        holder: holder.name(),
                        requester: routine.name(),
                    });
                }
            }
        }

        let claimed: Requirements = routine.requirements().iter().copied().collect();
        let mut displaced: HVec<RoutineId, MAX_REQUIREMENTS> = HVec::new();

        for &m in &claimed {
            let Some(slot) = self.slot_mut(m) else { continue };
            match slot.holder {
                Holder::Default => {
                    slot.default.stop(io, StopReason::Interrupted);
                }
                Holder::Routine(h) => {
                    if !displaced.contains(&h) {
                        // Bounded by the claimant's requirement count.
                        let _ = displaced.push(h);
                    }
                }
            }
        }

        let claimant = routines[id.index()].name();
        for &h in &displaced {
            let victim = &mut routines[h.index()];
            debug!(routine = victim.name(), by = claimant, "routine interrupted");
            victim.stop(io, StopReason::Interrupted);
            let released: Requirements = victim
                .requirements()
                .iter()
                .copied()
                .filter(|m| !claimed.contains(m))
                .collect();
            for m in released {
                self.rebind_default(m, io);
            }
        }

        for &m in &claimed {
            if let Some(slot) = self.slot_mut(m) {
                slot.holder = Holder::Routine(id);
            }
        }

        match routines[id.index()].start(io) {
            Outcome::Running => Ok(ClaimOutcome::Started),
            Outcome::Completed => {
                self.release(id, io);
                Ok(ClaimOutcome::Completed)
            }
            Outcome::Faulted(e) => {
                self.release(id, io);
                Ok(ClaimOutcome::Faulted(e))
            }
        }
    }

    /// Return every mechanism held by `id` to its default routine and start
    /// that default. The routine itself must already be stopped.
    ///
    /// Returns the number of mechanisms released.
    pub fn release(&mut self, id: RoutineId, io: &mut TickIo<'_>) -> usize {
        let mut count = 0;
        for i in 0..MAX_MECHANISMS {
            let m = MechanismId(i as u8);
            if self.holder(m) == Some(Holder::Routine(id)) {
                self.rebind_default(m, io);
                count += 1;
            }
        }
        count
    }

    fn rebind_default(&mut self, id: MechanismId, io: &mut TickIo<'_>) {
        let Some(slot) = self.slot_mut(id) else { return };
        slot.holder = Holder::Default;
        if let Outcome::Faulted(e) = slot.default.start(io) {
            warn!(mechanism = %id, routine = slot.default.name(), error = %e, "default routine failed to start");
        }
    }

    // ─── Default routines ───────────────────────────────────────────

    /// Tick every default routine that holds its mechanism.
    pub fn tick_defaults(&mut self, io: &mut TickIo<'_>) {
        for slot in self.slots.iter_mut().flatten() {
            if slot.holder == Holder::Default && slot.default.is_due(io.tick) {
                slot.default.tick(io);
            }
        }
    }

    /// Start defaults that hold their mechanism but are idle.
    ///
    /// A default that stopped during this tick is left for the next one, so
    /// a routine failing in `on_start` is retried once per tick at most.
    pub fn backfill(&mut self, io: &mut TickIo<'_>) {
        for slot in self.slots.iter_mut().flatten() {
            let idle = slot.default.state() == RoutineState::Idle;
            let stopped_now = slot.default.stopped_tick() == Some(io.tick);
            if slot.holder == Holder::Default && idle && !stopped_now {
                slot.default.start(io);
            }
        }
    }

    /// Hand every mechanism back to its default without starting it.
    pub fn reset_holders(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.holder = Holder::Default;
        }
    }

    /// Stop every running default (shutdown path).
    pub fn stop_defaults(&mut self, io: &mut TickIo<'_>, reason: StopReason) {
        for slot in self.slots.iter_mut().flatten() {
            slot.default.stop(io, reason);
        }
    }

    // ─── Invariants ─────────────────────────────────────────────────

    /// Check ownership consistency against the routine pool.
    pub fn verify(&self, routines: &[Routine]) -> Result<(), String> {
        for m in self.mechanisms() {
            let Some(slot) = self.slot(m) else { continue };
            if let Holder::Routine(h) = slot.holder {
                let Some(r) = routines.get(h.index()) else {
                    return Err(format!("{m} held by unknown {h}"));
                };
                if !r.is_scheduled() {
                    return Err(format!("{m} held by idle routine '{}'", r.name()));
                }
                if !r.requires(m) {
                    return Err(format!("{m} held by '{}' which does not require it", r.name()));
                }
                if slot.default.is_scheduled() {
                    return Err(format!("{m} default '{}' running while displaced", slot.default.name()));
                }
            }
        }
        for (i, r) in routines.iter().enumerate() {
            if !r.is_scheduled() {
                continue;
            }
            let id = RoutineId(i as u16);
            for &m in r.requirements() {
                if self.holder(m) != Some(Holder::Routine(id)) {
                    return Err(format!("'{}' scheduled without holding {m}", r.name()));
                }
            }
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
