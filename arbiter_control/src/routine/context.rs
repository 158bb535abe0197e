//! Per-tick I/O handed to routine callbacks.
//!
//! [`TickIo`] carries the sampled hardware status, the actuation frame being
//! built and the tick counters. Each callback receives a [`RoutineContext`]
//! scoped to the routine's own requirements, so a routine can only actuate
//! mechanisms it holds.

use arbiter_common::hal::types::{ActuationFrame, ActuatorRequest, DigitalInputId, HalStatus};
use arbiter_common::input::controller::InputSnapshot;
use arbiter_common::sched::error::RoutineError;
use arbiter_common::sched::state::MechanismId;

/// Counters accumulated while processing one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number (1-based).
    pub tick: u64,
    /// `on_start` invocations (explicit and default routines).
    pub started: u32,
    /// `on_stop` invocations, any reason.
    pub stopped: u32,
    /// Stops caused by the routine's own completion.
    pub completed: u32,
    /// Stops caused by another routine claiming a mechanism.
    pub interrupted: u32,
    /// Stops caused by a failing callback.
    pub faulted: u32,
    /// Claims rejected with `OwnershipConflict`.
    pub conflicts: u32,
}

/// Mutable view of one tick, threaded through the registry and routines.
pub struct TickIo<'a> {
    pub tick: u64,
    pub status: &'a HalStatus,
    pub frame: &'a mut ActuationFrame,
    pub report: TickReport,
}

impl<'a> TickIo<'a> {
    pub fn new(tick: u64, status: &'a HalStatus, frame: &'a mut ActuationFrame) -> Self {
        Self {
            tick,
            status,
            frame,
            report: TickReport {
                tick,
                ..TickReport::default()
            },
        }
    }

    /// Callback context limited to `requirements`.
    pub fn context<'b>(&'b mut self, requirements: &'b [MechanismId]) -> RoutineContext<'b> {
        RoutineContext {
            tick: self.tick,
            requirements,
            status: self.status,
            frame: &mut *self.frame,
        }
    }
}

/// What a routine callback may see and do.
pub struct RoutineContext<'a> {
    tick: u64,
    requirements: &'a [MechanismId],
    status: &'a HalStatus,
    frame: &'a mut ActuationFrame,
}

impl RoutineContext<'_> {
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn input(&self) -> &InputSnapshot {
        &self.status.input
    }

    #[inline]
    pub fn status(&self) -> &HalStatus {
        self.status
    }

    /// Raw digital input level.
    #[inline]
    pub fn read_digital(&self, id: DigitalInputId) -> bool {
        self.status.read_digital(id)
    }

    #[inline]
    pub fn requires(&self, mechanism: MechanismId) -> bool {
        self.requirements.contains(&mechanism)
    }

    /// Queue a request for one channel of a mechanism this routine requires.
    pub fn actuate(
        &mut self,
        mechanism: MechanismId,
        channel: u8,
        request: ActuatorRequest,
    ) -> Result<(), RoutineError> {
        if !self.requires(mechanism) {
            return Err(RoutineError::NotOwner(mechanism));
        }
        self.frame.set(mechanism, channel, request)
    }

    /// Same request on several channels (follower motors, paired arms).
    pub fn actuate_channels(
        &mut self,
        mechanism: MechanismId,
        channels: &[u8],
        request: ActuatorRequest,
    ) -> Result<(), RoutineError> {
        for &channel in channels {
            self.actuate(mechanism, channel, request)?;
        }
        Ok(())
    }
}
