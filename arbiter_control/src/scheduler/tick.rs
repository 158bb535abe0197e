//! The cooperative scheduler and its three-phase tick.
//!
//! ## Tick phases
//!
//! 1. **Requests** - queued external requests, then trigger polls, applied in
//!    order. Claims run `on_start` (and `on_stop` of anything displaced)
//!    immediately.
//! 2. **Execute** - `on_tick` of every running explicit routine in id order,
//!    then of every default holding its mechanism. A routine started during
//!    this tick is skipped until the next one.
//! 3. **Backfill** - idle defaults that hold their mechanism are started.
//!
//! All routine callbacks run synchronously on the caller's thread; nothing
//! here blocks or sleeps.

use tracing::{debug, trace, warn};

use arbiter_common::hal::types::{ActuationFrame, HalStatus};
use arbiter_common::sched::error::SchedulerError;
use arbiter_common::sched::state::{MechanismId, RoutineId, RoutineState, StopReason};

use crate::routine::context::{TickIo, TickReport};
use crate::routine::lifecycle::{Outcome, Routine};
use crate::trigger::binder::{Request, TriggerBinder};

use super::registry::{ClaimOutcome, Holder, SubsystemRegistry};

/// Owns the registry, the explicit routine pool and the trigger binder.
#[derive(Debug)]
pub struct Scheduler {
    registry: SubsystemRegistry,
    routines: Vec<Routine>,
    binder: TriggerBinder,
    /// External requests waiting for the next tick.
    queued: Vec<Request>,
    /// Scratch buffer reused every tick.
    requests: Vec<Request>,
    tick: u64,
    last_report: TickReport,
}

impl Scheduler {
    pub(crate) fn new(
        registry: SubsystemRegistry,
        routines: Vec<Routine>,
        binder: TriggerBinder,
    ) -> Self {
        Self {
            registry,
            routines,
            binder,
            queued: Vec::with_capacity(16),
            requests: Vec::with_capacity(32),
            tick: 0,
            last_report: TickReport::default(),
        }
    }

    // ─── External requests ──────────────────────────────────────────

    /// Request that `id` be scheduled at the next tick boundary.
    pub fn schedule(&mut self, id: RoutineId) {
        self.queued.push(Request::Schedule(id));
    }

    /// Request that `id` be cancelled at the next tick boundary.
    pub fn cancel(&mut self, id: RoutineId) {
        self.queued.push(Request::Cancel(id));
    }

    // ─── Queries ────────────────────────────────────────────────────

    pub fn is_scheduled(&self, id: RoutineId) -> bool {
        self.routines.get(id.index()).is_some_and(Routine::is_scheduled)
    }

    pub fn routine(&self, id: RoutineId) -> Option<&Routine> {
        self.routines.get(id.index())
    }

    pub fn routine_state(&self, id: RoutineId) -> Option<RoutineState> {
        self.routine(id).map(Routine::state)
    }

    /// Look a routine up by name (first match).
    pub fn find(&self, name: &str) -> Option<RoutineId> {
        self.routines
            .iter()
            .position(|r| r.name() == name)
            .map(|i| RoutineId(i as u16))
    }

    pub fn holder(&self, mechanism: MechanismId) -> Option<Holder> {
        self.registry.holder(mechanism)
    }

    pub fn registry(&self) -> &SubsystemRegistry {
        &self.registry
    }

    pub fn binder(&self) -> &TriggerBinder {
        &self.binder
    }

    /// Number of completed ticks.
    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn last_report(&self) -> TickReport {
        self.last_report
    }

    /// Ownership consistency check over the whole pool.
    pub fn verify(&self) -> Result<(), String> {
        self.registry.verify(&self.routines)
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// Run one scheduling tick against `status`, writing requests to `frame`.
    pub fn tick(&mut self, status: &HalStatus, frame: &mut ActuationFrame) -> TickReport {
        self.tick += 1;
        let mut io = TickIo::new(self.tick, status, frame);

        // Phase 1: requests.
        let mut requests = core::mem::take(&mut self.requests);
        requests.clear();
        requests.append(&mut self.queued);
        {
            let routines = &self.routines;
            let is_scheduled =
                |id: RoutineId| routines.get(id.index()).is_some_and(Routine::is_scheduled);
            self.binder.poll(status, &is_scheduled, &mut requests);
        }
        for &request in &requests {
            self.apply(request, &mut io);
        }
        self.requests = requests;

        // Phase 2: execute.
        for i in 0..self.routines.len() {
            if !self.routines[i].is_due(io.tick) {
                continue;
            }
            match self.routines[i].tick(&mut io) {
                Outcome::Running => {}
                Outcome::Completed | Outcome::Faulted(_) => {
                    self.registry.release(RoutineId(i as u16), &mut io);
                }
            }
        }
        self.registry.tick_defaults(&mut io);

        // Phase 3: backfill.
        self.registry.backfill(&mut io);

        debug_assert_eq!(self.registry.verify(&self.routines), Ok(()));

        if io.report.started + io.report.stopped > 0 {
            trace!(report = ?io.report, "tick transitions");
        }
        self.last_report = io.report;
        io.report
    }

    fn apply(&mut self, request: Request, io: &mut TickIo<'_>) {
        match request {
            Request::Schedule(id) => match self.registry.claim(id, &mut self.routines, io) {
                Ok(ClaimOutcome::Faulted(e)) => {
                    debug!(routine = %id, error = %e, "routine faulted during start");
                }
                Ok(outcome) => trace!(routine = %id, ?outcome, "claim"),
                Err(e @ SchedulerError::OwnershipConflict { .. }) => {
                    io.report.conflicts += 1;
                    warn!(error = %e, "schedule request dropped");
                }
                Err(e) => warn!(routine = %id, error = %e, "schedule request rejected"),
            },
            Request::Cancel(id) => {
                let Some(routine) = self.routines.get_mut(id.index()) else {
                    warn!(routine = %id, "cancel for unknown routine");
                    return;
                };
                if routine.stop(io, StopReason::Cancelled) {
                    self.registry.release(id, io);
                }
            }
        }
    }

    /// Stop everything: explicit routines first, then defaults.
    ///
    /// Every routine that was started gets its `on_stop`, so mechanisms end
    /// in their safe state. Run once as the last tick before the driver
    /// shuts down.
    pub fn shutdown(&mut self, status: &HalStatus, frame: &mut ActuationFrame) -> TickReport {
        self.tick += 1;
        let mut io = TickIo::new(self.tick, status, frame);
        self.queued.clear();
        for routine in &mut self.routines {
            routine.stop(&mut io, StopReason::Cancelled);
        }
        self.registry.reset_holders();
        self.registry.stop_defaults(&mut io, StopReason::Cancelled);
        debug!(stopped = io.report.stopped, "scheduler shut down");
        self.last_report = io.report;
        io.report
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
