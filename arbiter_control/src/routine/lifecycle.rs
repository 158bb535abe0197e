//! Routine object and its lifecycle transitions.
//!
//! `Idle → Starting → Running → Stopping → Idle`. Instant routines and
//! routines that finish or fault inside `on_start` go straight from
//! `Starting` to `Stopping`. `on_stop` runs exactly once for every
//! `on_start`, whatever the reason.

use heapless::Vec as HVec;
use tracing::{debug, warn};

use arbiter_common::consts::MAX_REQUIREMENTS;
use arbiter_common::sched::error::{RoutineError, SchedulerError};
use arbiter_common::sched::state::{
    Flow, InterruptBehavior, MechanismId, RoutineKind, RoutineState, StopReason,
};

use super::context::{RoutineContext, TickIo};

/// Mechanisms a routine requires, deduplicated.
pub type Requirements = HVec<MechanismId, MAX_REQUIREMENTS>;

/// `on_start` / `on_tick` callback.
pub type StepFn = Box<dyn FnMut(&mut RoutineContext<'_>) -> Result<Flow, RoutineError>>;
/// `on_stop` callback.
pub type StopFn = Box<dyn FnMut(&mut RoutineContext<'_>, StopReason) -> Result<(), RoutineError>>;

// ─── Transition table ───────────────────────────────────────────────

/// Lifecycle event driving a [`RoutineState`] change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Mechanisms granted, `on_start` about to run.
    Claimed,
    /// `on_start` returned and the routine keeps running.
    Started,
    /// Completion, interruption, cancellation or fault.
    Stop,
    /// `on_stop` returned.
    Stopped,
}

/// Next state for `(state, event)`, or `None` if the pair is invalid.
pub const fn next_state(state: RoutineState, event: LifecycleEvent) -> Option<RoutineState> {
    use LifecycleEvent::*;
    use RoutineState::*;

    match (state, event) {
        (Idle, Claimed) => Some(Starting),
        (Starting, Started) => Some(Running),
        (Starting, Stop) | (Running, Stop) => Some(Stopping),
        (Stopping, Stopped) => Some(Idle),
        _ => None,
    }
}

/// Result of running a lifecycle callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Routine is (still) running.
    Running,
    /// Routine finished on its own; `on_stop` has already run.
    Completed,
    /// A callback failed; `on_stop` has already run.
    Faulted(RoutineError),
}

// ─── Routine ────────────────────────────────────────────────────────

/// A unit of behavior with declared requirements and three lifecycle hooks.
pub struct Routine {
    name: &'static str,
    requirements: Requirements,
    interrupt: InterruptBehavior,
    kind: RoutineKind,
    on_start: StepFn,
    on_tick: StepFn,
    on_stop: StopFn,
    state: RoutineState,
    started_tick: u64,
    stopped_tick: Option<u64>,
    starts: u64,
    last_stop: Option<StopReason>,
}

impl core::fmt::Debug for Routine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Routine")
            .field("name", &self.name)
            .field("requirements", &self.requirements)
            .field("interrupt", &self.interrupt)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Routine {
    /// Routine with no-op hooks. Duplicate requirements are collapsed.
    pub fn new(name: &'static str, requirements: &[MechanismId]) -> Result<Self, SchedulerError> {
        let mut reqs = Requirements::new();
        for &m in requirements {
            if !reqs.contains(&m) {
                reqs.push(m)
                    .map_err(|_| SchedulerError::TooManyRequirements(name))?;
            }
        }
        Ok(Self {
            name,
            requirements: reqs,
            interrupt: InterruptBehavior::CancelSelf,
            kind: RoutineKind::Continuous,
            on_start: Box::new(|_| Ok(Flow::Continue)),
            on_tick: Box::new(|_| Ok(Flow::Continue)),
            on_stop: Box::new(|_, _| Ok(())),
            state: RoutineState::Idle,
            started_tick: 0,
            stopped_tick: None,
            starts: 0,
            last_stop: None,
        })
    }

    /// Calls `body` every tick until interrupted or cancelled.
    pub fn run<F>(name: &'static str, requirements: &[MechanismId], mut body: F) -> Result<Self, SchedulerError>
    where
        F: FnMut(&mut RoutineContext<'_>) -> Result<(), RoutineError> + 'static,
    {
        Ok(Self::new(name, requirements)?.on_tick(move |ctx| body(ctx).map(|()| Flow::Continue)))
    }

    /// Calls `body` every tick until it returns [`Flow::Finished`].
    pub fn run_until<F>(name: &'static str, requirements: &[MechanismId], body: F) -> Result<Self, SchedulerError>
    where
        F: FnMut(&mut RoutineContext<'_>) -> Result<Flow, RoutineError> + 'static,
    {
        Ok(Self::new(name, requirements)?
            .on_tick(body)
            .with_kind(RoutineKind::RunToCompletion))
    }

    /// Runs `start` once when scheduled and `end` once when stopped.
    pub fn start_end<S, E>(
        name: &'static str,
        requirements: &[MechanismId],
        mut start: S,
        mut end: E,
    ) -> Result<Self, SchedulerError>
    where
        S: FnMut(&mut RoutineContext<'_>) -> Result<(), RoutineError> + 'static,
        E: FnMut(&mut RoutineContext<'_>) -> Result<(), RoutineError> + 'static,
    {
        Ok(Self::new(name, requirements)?
            .on_start(move |ctx| start(ctx).map(|()| Flow::Continue))
            .on_stop(move |ctx, _| end(ctx)))
    }

    /// Runs `action` once; starts and stops within a single tick.
    pub fn instant<F>(name: &'static str, requirements: &[MechanismId], mut action: F) -> Result<Self, SchedulerError>
    where
        F: FnMut(&mut RoutineContext<'_>) -> Result<(), RoutineError> + 'static,
    {
        Ok(Self::new(name, requirements)?
            .on_start(move |ctx| action(ctx).map(|()| Flow::Finished))
            .with_kind(RoutineKind::Instant))
    }

    // ── Builder ─────────────────────────────────────────────────────

    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut RoutineContext<'_>) -> Result<Flow, RoutineError> + 'static,
    {
        self.on_start = Box::new(f);
        self
    }

    pub fn on_tick<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut RoutineContext<'_>) -> Result<Flow, RoutineError> + 'static,
    {
        self.on_tick = Box::new(f);
        self
    }

    pub fn on_stop<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut RoutineContext<'_>, StopReason) -> Result<(), RoutineError> + 'static,
    {
        self.on_stop = Box::new(f);
        self
    }

    pub fn with_interrupt(mut self, interrupt: InterruptBehavior) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn with_kind(mut self, kind: RoutineKind) -> Self {
        self.kind = kind;
        self
    }

    // ── Accessors ───────────────────────────────────────────────────

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn requirements(&self) -> &[MechanismId] {
        &self.requirements
    }

    #[inline]
    pub fn requires(&self, mechanism: MechanismId) -> bool {
        self.requirements.contains(&mechanism)
    }

    #[inline]
    pub fn interrupt(&self) -> InterruptBehavior {
        self.interrupt
    }

    #[inline]
    pub fn kind(&self) -> RoutineKind {
        self.kind
    }

    #[inline]
    pub fn state(&self) -> RoutineState {
        self.state
    }

    #[inline]
    pub fn is_scheduled(&self) -> bool {
        self.state.is_scheduled()
    }

    /// Number of times `on_start` has run.
    #[inline]
    pub fn starts(&self) -> u64 {
        self.starts
    }

    /// Reason for the most recent stop.
    #[inline]
    pub fn last_stop(&self) -> Option<StopReason> {
        self.last_stop
    }

    /// Tick at which the routine last stopped.
    #[inline]
    pub fn stopped_tick(&self) -> Option<u64> {
        self.stopped_tick
    }

    /// Running and started before `tick`. A routine started during a tick
    /// gets its first `on_tick` on the following one.
    #[inline]
    pub fn is_due(&self, tick: u64) -> bool {
        self.state == RoutineState::Running && self.started_tick != tick
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    fn advance(&mut self, event: LifecycleEvent) {
        match next_state(self.state, event) {
            Some(next) => self.state = next,
            None => debug_assert!(
                false,
                "routine '{}': invalid transition {:?} on {:?}",
                self.name, self.state, event
            ),
        }
    }

    /// Run `on_start`. Caller must have granted the requirements.
    pub(crate) fn start(&mut self, io: &mut TickIo<'_>) -> Outcome {
        if self.state != RoutineState::Idle {
            return Outcome::Running;
        }
        self.advance(LifecycleEvent::Claimed);
        self.started_tick = io.tick;
        self.starts += 1;
        io.report.started += 1;
        debug!(routine = self.name, tick = io.tick, "routine started");

        let result = {
            let mut ctx = io.context(&self.requirements);
            (self.on_start)(&mut ctx)
        };
        match result {
            Ok(Flow::Continue) if self.kind != RoutineKind::Instant => {
                self.advance(LifecycleEvent::Started);
                Outcome::Running
            }
            Ok(_) => {
                self.finish(io, StopReason::Finished);
                Outcome::Completed
            }
            Err(e) => {
                warn!(routine = self.name, error = %e, "on_start failed");
                self.finish(io, StopReason::Faulted);
                Outcome::Faulted(e)
            }
        }
    }

    /// Run `on_tick` once.
    pub(crate) fn tick(&mut self, io: &mut TickIo<'_>) -> Outcome {
        if self.state != RoutineState::Running {
            return Outcome::Running;
        }
        let result = {
            let mut ctx = io.context(&self.requirements);
            (self.on_tick)(&mut ctx)
        };
        match result {
            Ok(Flow::Continue) => Outcome::Running,
            Ok(Flow::Finished) => {
                self.finish(io, StopReason::Finished);
                Outcome::Completed
            }
            Err(e) => {
                warn!(routine = self.name, error = %e, "on_tick failed");
                self.finish(io, StopReason::Faulted);
                Outcome::Faulted(e)
            }
        }
    }

    /// Stop a scheduled routine from outside. Returns `false` if it was idle.
    pub(crate) fn stop(&mut self, io: &mut TickIo<'_>, reason: StopReason) -> bool {
        if !matches!(self.state, RoutineState::Starting | RoutineState::Running) {
            return false;
        }
        self.finish(io, reason);
        true
    }

    fn finish(&mut self, io: &mut TickIo<'_>, reason: StopReason) {
        self.advance(LifecycleEvent::Stop);
        let result = {
            let mut ctx = io.context(&self.requirements);
            (self.on_stop)(&mut ctx, reason)
        };
        // on_stop failures are reported but the routine still ends.
        if let Err(e) = result {
            warn!(routine = self.name, error = %e, "on_stop failed");
        }
        self.advance(LifecycleEvent::Stopped);
        self.stopped_tick = Some(io.tick);
        self.last_stop = Some(reason);

        io.report.stopped += 1;
        match reason {
            StopReason::Finished => io.report.completed += 1,
            StopReason::Interrupted => io.report.interrupted += 1,
            StopReason::Faulted => io.report.faulted += 1,
            StopReason::Cancelled => {}
        }
        debug!(routine = self.name, tick = io.tick, %reason, "routine stopped");
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
