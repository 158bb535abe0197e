//! The boundary between the scheduler and the hardware.
//!
//! A [`HalDriver`] samples everything the scheduler reads in one tick
//! ([`HalStatus`]) and forwards everything it wrote ([`ActuationFrame`]).
//! Backends: the simulation driver in `arbiter_control`, or a real bus
//! driver behind the same trait.

use crate::hal::types::{ActuationFrame, HalStatus};
use thiserror::Error;

/// Driver setup and teardown failures. Per-tick I/O does not fail; a
/// driver that loses a device reports it through its diagnostics.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Hardware did not come up.
    #[error("driver init failed: {0}")]
    InitFailed(String),

    /// Driver parameters are unusable.
    #[error("driver misconfigured: {0}")]
    ConfigError(String),

    /// Bus or device error outside the tick loop.
    #[error("device I/O failed: {0}")]
    CommunicationError(String),
}

/// Counters a driver may expose for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverDiagnostics {
    pub frames_written: u64,
    /// Channel requests actually forwarded to a device.
    pub requests_forwarded: u64,
    /// Free-form backend status line.
    pub note: Option<String>,
}

/// Hardware backend driven by the cycle runner.
///
/// Call order: `init` once, then `read` / `write` pairs once per tick, then
/// `shutdown`. `read` and `write` never block: actuation is fire-and-forget
/// and sensor reads return the latest sample.
pub trait HalDriver {
    /// Short backend id, e.g. `"simulation"`.
    fn name(&self) -> &'static str;

    fn version(&self) -> &'static str;

    /// Bring the hardware up. May block; runs before the first tick.
    fn init(&mut self) -> Result<(), HalError>;

    /// Operator input and digital inputs for the coming tick.
    fn read(&mut self) -> HalStatus;

    /// Apply this tick's requests. Channels absent from `frame` keep their
    /// previous command.
    fn write(&mut self, frame: &ActuationFrame);

    /// Neutral every actuator and release the hardware.
    fn shutdown(&mut self) -> Result<(), HalError>;

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        None
    }
}
