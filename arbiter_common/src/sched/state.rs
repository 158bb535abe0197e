//! Identifier and lifecycle enums for the scheduler.
//!
//! Identifiers are small copyable newtypes resolved through the subsystem
//! registry, never references to the mechanism objects themselves.

use core::fmt;

use serde::{Deserialize, Serialize};

// ─── Identifiers ────────────────────────────────────────────────────

/// Stable identity of a physical mechanism (registry slot index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MechanismId(pub u8);

impl MechanismId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MechanismId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mechanism#{}", self.0)
    }
}

/// Identity of an explicit (non-default) routine in the scheduler pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoutineId(pub u16);

impl RoutineId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "routine#{}", self.0)
    }
}

/// Identity of a trigger registered with the binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerId(pub u16);

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger#{}", self.0)
    }
}

// ─── Lifecycle ──────────────────────────────────────────────────────

/// Routine lifecycle phase.
///
/// `Idle → Starting → Running → Stopping → Idle`. Instantaneous routines
/// skip `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum RoutineState {
    #[default]
    Idle = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
}

impl RoutineState {
    /// A routine counts as scheduled from the moment `on_start` begins until
    /// `on_stop` has completed.
    #[inline]
    pub const fn is_scheduled(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// What happens when another routine requests a mechanism this one holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InterruptBehavior {
    /// Yield immediately to any conflicting request.
    #[default]
    CancelSelf,
    /// Reject conflicting requests while this routine is scheduled.
    CancelIncoming,
}

/// Routine variant. All variants share the same closure triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoutineKind {
    /// Runs until interrupted or cancelled.
    #[default]
    Continuous,
    /// Runs until `on_tick` reports [`Flow::Finished`].
    RunToCompletion,
    /// `on_start` then `on_stop` within the same tick.
    Instant,
}

/// Value returned by `on_start` and `on_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    Finished,
}

/// Why `on_stop` is being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The routine signalled its own completion.
    Finished,
    /// Another routine claimed one of its mechanisms.
    Interrupted,
    /// An explicit cancel (binding release, external request).
    Cancelled,
    /// A lifecycle callback returned an error.
    Faulted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Finished => "finished",
            Self::Interrupted => "interrupted",
            Self::Cancelled => "cancelled",
            Self::Faulted => "faulted",
        };
        f.write_str(s)
    }
}
