//! Scheduler and routine error types.
//!
//! `OwnershipConflict` is the only error produced while ticking; it is logged
//! and the request dropped. All other [`SchedulerError`] variants are setup
//! errors and fatal before the first tick.

use thiserror::Error;

use super::state::{MechanismId, RoutineId};

/// Errors raised by the registry, scheduler and scheduler builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Claim rejected: a `CancelIncoming` routine holds the mechanism.
    #[error("ownership conflict on {mechanism}: held by '{holder}', requested by '{requester}'")]
    OwnershipConflict {
        mechanism: MechanismId,
        holder: &'static str,
        requester: &'static str,
    },

    /// A routine references a mechanism with no registered default routine.
    #[error("routine '{routine}' requires {mechanism}, which has no default routine")]
    UnboundMechanism {
        routine: &'static str,
        mechanism: MechanismId,
    },

    /// The same mechanism id was registered twice.
    #[error("{0} registered twice")]
    DuplicateMechanism(MechanismId),

    /// A registered mechanism has no default routine installed.
    #[error("{mechanism} ('{name}') has no default routine")]
    MissingDefault {
        mechanism: MechanismId,
        name: &'static str,
    },

    /// A default routine must require exactly its own mechanism.
    #[error("default routine '{routine}' for {mechanism} must require exactly that mechanism")]
    DefaultRequirementMismatch {
        routine: &'static str,
        mechanism: MechanismId,
    },

    /// A binding or request names a routine that does not exist.
    #[error("unknown {0}")]
    UnknownRoutine(RoutineId),

    /// A routine lists more mechanisms than fit in its requirement set.
    #[error("routine '{0}' exceeds the requirement capacity")]
    TooManyRequirements(&'static str),

    /// A fixed-capacity table is full.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(&'static str),
}

/// Failure reported by a routine callback.
///
/// Any error ends the routine: its `on_stop` runs with `StopReason::Faulted`
/// and its mechanisms revert to their default routines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutineError {
    /// The routine tried to actuate a mechanism it does not require.
    #[error("{0} is not required by this routine")]
    NotOwner(MechanismId),

    /// Channel index outside the mechanism's channel table.
    #[error("channel {channel} out of range on {mechanism}")]
    InvalidChannel { mechanism: MechanismId, channel: u8 },

    /// Policy-specific failure.
    #[error("routine fault: {0}")]
    Fault(String),
}
