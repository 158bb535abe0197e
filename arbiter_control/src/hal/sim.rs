//! Simulation driver.
//!
//! The `SimDriver` implements [`HalDriver`] with software motors and an
//! optional input script, so the full robot can run without hardware.
//! Each motor remembers the last request it received and integrates a
//! simple position model once per written frame.

use tracing::{debug, info};

use arbiter_common::consts::{MAX_CHANNELS, MAX_MECHANISMS};
use arbiter_common::hal::driver::{DriverDiagnostics, HalDriver, HalError};
use arbiter_common::hal::types::{ActuationFrame, Actuator, ActuatorRequest, GainProfile, HalStatus};
use arbiter_common::sched::state::MechanismId;

use super::script::ScriptPlayer;

/// Nominal supply voltage used to scale duty-cycle requests.
const BUS_VOLTS: f64 = 12.0;
/// Open-loop speed at full supply, rotations per second.
const FREE_SPEED_RPS: f64 = 100.0;
/// Closed-loop settling time constant, seconds.
const POSITION_TAU_S: f64 = 0.1;

// ─── Motor model ────────────────────────────────────────────────────

/// A simulated motor controller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimMotor {
    last: Option<ActuatorRequest>,
    applied_volts: f64,
    target: Option<(f64, GainProfile)>,
    position: f64,
    writes: u64,
}

impl SimMotor {
    /// Most recent request.
    pub fn last_request(&self) -> Option<ActuatorRequest> {
        self.last
    }

    pub fn applied_volts(&self) -> f64 {
        self.applied_volts
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Active closed-loop gain slot, if holding a position.
    pub fn gain_slot(&self) -> Option<u8> {
        self.target.map(|(_, profile)| profile.slot())
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Advance the position model by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        match self.target {
            Some((target, _)) => {
                let alpha = (dt / POSITION_TAU_S).min(1.0);
                self.position += (target - self.position) * alpha;
            }
            None => {
                self.position += self.applied_volts / BUS_VOLTS * FREE_SPEED_RPS * dt;
            }
        }
    }
}

impl Actuator for SimMotor {
    fn set_output(&mut self, fraction: f64) {
        self.last = Some(ActuatorRequest::Output(fraction));
        self.applied_volts = fraction * BUS_VOLTS;
        self.target = None;
        self.writes += 1;
    }

    fn set_voltage(&mut self, volts: f64) {
        self.last = Some(ActuatorRequest::Voltage(volts));
        self.applied_volts = volts.clamp(-BUS_VOLTS, BUS_VOLTS);
        self.target = None;
        self.writes += 1;
    }

    fn set_position(&mut self, target: f64, profile: GainProfile) {
        self.last = Some(ActuatorRequest::Position { target, profile });
        self.target = Some((target, profile));
        self.writes += 1;
    }

    fn set_neutral(&mut self) {
        self.last = Some(ActuatorRequest::Neutral);
        self.applied_volts = 0.0;
        self.target = None;
        self.writes += 1;
    }
}

// ─── Driver ─────────────────────────────────────────────────────────

/// Simulation driver implementing the HalDriver trait.
#[derive(Debug)]
pub struct SimDriver {
    name: &'static str,
    version: &'static str,
    initialized: bool,
    /// Seconds per tick.
    dt: f64,
    tick: u64,
    status: HalStatus,
    motors: [[SimMotor; MAX_CHANNELS]; MAX_MECHANISMS],
    script: Option<ScriptPlayer>,
    diagnostics: DriverDiagnostics,
}

impl SimDriver {
    pub fn new(period_ms: u32) -> Self {
        Self {
            name: "simulation",
            version: env!("CARGO_PKG_VERSION"),
            initialized: false,
            dt: f64::from(period_ms) / 1000.0,
            tick: 0,
            status: HalStatus::default(),
            motors: [[SimMotor::default(); MAX_CHANNELS]; MAX_MECHANISMS],
            script: None,
            diagnostics: DriverDiagnostics::default(),
        }
    }

    pub fn with_script(mut self, script: ScriptPlayer) -> Self {
        self.script = Some(script);
        self
    }

    /// Direct access to the next sampled status (tests, fixtures).
    pub fn status_mut(&mut self) -> &mut HalStatus {
        &mut self.status
    }

    pub fn motor(&self, mechanism: MechanismId, channel: u8) -> Option<&SimMotor> {
        self.motors
            .get(mechanism.index())
            .and_then(|channels| channels.get(channel as usize))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// True once an attached script has played every step.
    pub fn script_finished(&self) -> bool {
        self.script.as_ref().is_none_or(ScriptPlayer::finished)
    }
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new(arbiter_common::consts::DEFAULT_TICK_PERIOD_MS)
    }
}

impl HalDriver for SimDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self) -> Result<(), HalError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(HalError::ConfigError(format!("invalid tick period {} s", self.dt)));
        }
        info!(
            dt_ms = self.dt * 1000.0,
            scripted = self.script.is_some(),
            "Simulation driver initialized"
        );
        self.initialized = true;
        Ok(())
    }

    fn read(&mut self) -> HalStatus {
        self.tick += 1;
        if let Some(script) = &mut self.script {
            script.advance(self.tick, &mut self.status);
        }
        self.status.clone()
    }

    fn write(&mut self, frame: &ActuationFrame) {
        let mut forwarded = 0u64;
        for (mechanism, channel, request) in frame.iter() {
            if let Some(motor) = self
                .motors
                .get_mut(mechanism.index())
                .and_then(|channels| channels.get_mut(channel as usize))
            {
                request.apply_to(motor);
                forwarded += 1;
            }
        }
        for motor in self.motors.iter_mut().flatten() {
            motor.step(self.dt);
        }
        self.diagnostics.frames_written += 1;
        self.diagnostics.requests_forwarded += forwarded;
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        for motor in self.motors.iter_mut().flatten() {
            motor.set_neutral();
        }
        debug!(frames = self.diagnostics.frames_written, "Simulation driver shutdown");
        self.initialized = false;
        Ok(())
    }

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        Some(self.diagnostics.clone())
    }
}
