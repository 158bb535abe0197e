//! Prelude module for common re-exports.
//!
//! `use arbiter_common::prelude::*;` brings in the types almost every
//! routine, binding and driver needs.

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{
    DEFAULT_AXIS_THRESHOLD, DEFAULT_DEADBAND, DEFAULT_TICK_PERIOD_MS, MAX_CHANNELS,
    MAX_MECHANISMS, MAX_REQUIREMENTS,
};

// ─── Scheduler ──────────────────────────────────────────────────────
pub use crate::sched::error::{RoutineError, SchedulerError};
pub use crate::sched::state::{
    Flow, InterruptBehavior, MechanismId, RoutineId, RoutineKind, RoutineState, StopReason,
    TriggerId,
};

// ─── Hardware ───────────────────────────────────────────────────────
pub use crate::hal::driver::{HalDriver, HalError};
pub use crate::hal::types::{
    ActuationFrame, Actuator, ActuatorRequest, DiLogic, DigitalInputId, GainProfile, HalStatus,
};

// ─── Operator Input ─────────────────────────────────────────────────
pub use crate::input::controller::{Axis, Buttons, ControllerPort, InputSnapshot};
pub use crate::input::shaping::{apply_deadband, exceeds_threshold};
