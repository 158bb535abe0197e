//! TOML configuration for the control binary.
//!
//! Every section is optional; missing fields fall back to the robot's
//! stock constants. [`load_config`] parses and validates in one step.
//!
//! ```toml
//! [shared]
//! service_name = "practice-bot"
//!
//! [cycle]
//! period_ms = 20
//!
//! [indexer]
//! beam_break_port = 0
//! beam_break_logic = "NC"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use arbiter_common::config::{ConfigError, ConfigLoader, SharedConfig};
use arbiter_common::consts::{
    DEFAULT_AXIS_THRESHOLD, DEFAULT_DEADBAND, DEFAULT_TICK_PERIOD_MS, MAX_CONTROLLERS, MAX_DI,
};
use arbiter_common::hal::types::{DiLogic, DigitalInputId};
use arbiter_common::input::controller::ControllerPort;

/// Largest open-loop voltage a policy may request.
pub const MAX_VOLTS: f64 = 12.0;

// ─── Sections ───────────────────────────────────────────────────────

/// `[cycle]`: tick pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Tick period in milliseconds.
    pub period_ms: u32,
    /// Log cycle statistics every N ticks (0 disables).
    pub stats_interval: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_TICK_PERIOD_MS,
            stats_interval: 500,
        }
    }
}

/// `[operator]`: controller ports and analog shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub driver_port: ControllerPort,
    pub operator_port: ControllerPort,
    /// Stick deadband for the drive axes.
    pub deadband: f64,
    /// Trigger axis value that counts as pressed (strictly above).
    pub trigger_threshold: f64,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            driver_port: ControllerPort(0),
            operator_port: ControllerPort(1),
            deadband: DEFAULT_DEADBAND,
            trigger_threshold: DEFAULT_AXIS_THRESHOLD,
        }
    }
}

/// `[intake]`: roller voltage and pivot angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub roller_volts: f64,
    pub retracted_deg: f64,
    pub extended_deg: f64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            roller_volts: 3.0,
            retracted_deg: 90.0,
            extended_deg: 0.0,
        }
    }
}

/// `[indexer]`: roller voltages and the beam-break sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub receive_volts: f64,
    pub feed_volts: f64,
    pub beam_break_port: DigitalInputId,
    /// Wiring of the beam break; `NC` means a broken beam reads low.
    pub beam_break_logic: DiLogic,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            receive_volts: 3.0,
            feed_volts: 5.0,
            beam_break_port: DigitalInputId(0),
            beam_break_logic: DiLogic::NC,
        }
    }
}

/// `[shooter]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterConfig {
    pub shoot_volts: f64,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self { shoot_volts: 6.0 }
    }
}

/// `[climber]`: arm targets in mechanism rotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimberConfig {
    pub retract_rot: f64,
    pub extend_rot: f64,
    pub pull_rot: f64,
}

impl Default for ClimberConfig {
    fn default() -> Self {
        Self {
            retract_rot: 0.1,
            extend_rot: 50.0,
            pull_rot: 20.0,
        }
    }
}

// ─── Top level ──────────────────────────────────────────────────────

/// Complete control configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub shared: SharedConfig,
    pub cycle: CycleConfig,
    pub operator: OperatorConfig,
    pub intake: IntakeConfig,
    pub indexer: IndexerConfig,
    pub shooter: ShooterConfig,
    pub climber: ClimberConfig,
}

fn check(ok: bool, msg: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(msg()))
    }
}

fn check_volts(name: &str, volts: f64) -> Result<(), ConfigError> {
    check(volts.is_finite() && volts.abs() <= MAX_VOLTS, || {
        format!("{name} = {volts} outside ±{MAX_VOLTS} V")
    })
}

fn check_finite(name: &str, value: f64) -> Result<(), ConfigError> {
    check(value.is_finite(), || format!("{name} must be finite"))
}

impl ControlConfig {
    /// Semantic validation of every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        check((1..=1000).contains(&self.cycle.period_ms), || {
            format!("cycle.period_ms = {} outside 1..=1000", self.cycle.period_ms)
        })?;

        let op = &self.operator;
        for (name, port) in [("driver_port", op.driver_port), ("operator_port", op.operator_port)] {
            check((port.0 as usize) < MAX_CONTROLLERS, || {
                format!("operator.{name} = {} exceeds {MAX_CONTROLLERS} controllers", port.0)
            })?;
        }
        check(op.driver_port != op.operator_port, || {
            "operator.driver_port and operator.operator_port must differ".to_string()
        })?;
        check((0.0..1.0).contains(&op.deadband), || {
            format!("operator.deadband = {} outside [0, 1)", op.deadband)
        })?;
        check((0.0..=1.0).contains(&op.trigger_threshold), || {
            format!("operator.trigger_threshold = {} outside [0, 1]", op.trigger_threshold)
        })?;

        check_volts("intake.roller_volts", self.intake.roller_volts)?;
        check_finite("intake.retracted_deg", self.intake.retracted_deg)?;
        check_finite("intake.extended_deg", self.intake.extended_deg)?;

        check_volts("indexer.receive_volts", self.indexer.receive_volts)?;
        check_volts("indexer.feed_volts", self.indexer.feed_volts)?;
        check((self.indexer.beam_break_port.0 as usize) < MAX_DI, || {
            format!(
                "indexer.beam_break_port = {} exceeds {MAX_DI} inputs",
                self.indexer.beam_break_port.0
            )
        })?;

        check_volts("shooter.shoot_volts", self.shooter.shoot_volts)?;

        check_finite("climber.retract_rot", self.climber.retract_rot)?;
        check_finite("climber.extend_rot", self.climber.extend_rot)?;
        check_finite("climber.pull_rot", self.climber.pull_rot)?;

        Ok(())
    }
}

/// Load and validate a control configuration file.
pub fn load_config(path: &Path) -> Result<ControlConfig, ConfigError> {
    let config = ControlConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate an in-memory TOML document.
pub fn load_config_str(content: &str) -> Result<ControlConfig, ConfigError> {
    let config = ControlConfig::from_toml_str(content)?;
    config.validate()?;
    Ok(config)
}

// ─── Tests ──────────────────────────────────────────────────────────
