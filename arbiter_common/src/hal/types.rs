//! HAL command and status types.
//!
//! This module defines the data exchanged with hardware drivers:
//! - `ActuatorRequest` / `ActuationFrame` - Per-channel requests written each tick
//! - `HalStatus` - Operator input and digital inputs sampled each tick
//! - `Actuator` - Motor-controller interface implemented by drivers
//! - `GainProfile`, `DiLogic` - Supporting configuration enums

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::consts::{MAX_CHANNELS, MAX_DI, MAX_MECHANISMS};
use crate::input::controller::InputSnapshot;
use crate::sched::error::RoutineError;
use crate::sched::state::MechanismId;

// ─── GainProfile ────────────────────────────────────────────────────

/// Closed-loop gain slot selected per position request.
///
/// Gains themselves live in the motor controller; only the slot choice is
/// part of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum GainProfile {
    /// Slot 0: mechanism unloaded (robot on the ground).
    #[default]
    Grounded = 0,
    /// Slot 1: mechanism carrying the robot's weight.
    Loaded = 1,
}

impl GainProfile {
    #[inline]
    pub const fn slot(self) -> u8 {
        self as u8
    }
}

// ─── Actuation ──────────────────────────────────────────────────────

/// A complete, idempotent request for one actuation channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorRequest {
    /// Duty-cycle output, fraction in [-1, 1].
    Output(f64),
    /// Open-loop voltage.
    Voltage(f64),
    /// Closed-loop position hold. Target and profile always travel together.
    Position { target: f64, profile: GainProfile },
    /// Neutral output (brake or coast per controller configuration).
    Neutral,
}

impl ActuatorRequest {
    /// Forward this request to a motor controller.
    pub fn apply_to(&self, actuator: &mut dyn Actuator) {
        match *self {
            Self::Output(fraction) => actuator.set_output(fraction.clamp(-1.0, 1.0)),
            Self::Voltage(volts) => actuator.set_voltage(volts),
            Self::Position { target, profile } => actuator.set_position(target, profile),
            Self::Neutral => actuator.set_neutral(),
        }
    }
}

/// Motor-controller interface consumed by drivers.
///
/// Every operation must be non-blocking, idempotent and safe to call every
/// tick.
pub trait Actuator {
    fn set_output(&mut self, fraction: f64);
    fn set_voltage(&mut self, volts: f64);
    fn set_position(&mut self, target: f64, profile: GainProfile);
    fn set_neutral(&mut self);
}

/// Requests produced during one tick, last write wins per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuationFrame {
    requests: [[Option<ActuatorRequest>; MAX_CHANNELS]; MAX_MECHANISMS],
}

impl Default for ActuationFrame {
    fn default() -> Self {
        Self {
            requests: [[None; MAX_CHANNELS]; MAX_MECHANISMS],
        }
    }
}

impl ActuationFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all requests (start of a tick).
    pub fn clear(&mut self) {
        for channels in self.requests.iter_mut() {
            channels.fill(None);
        }
    }

    /// Record a request, replacing any earlier one for the same channel.
    pub fn set(
        &mut self,
        mechanism: MechanismId,
        channel: u8,
        request: ActuatorRequest,
    ) -> Result<(), RoutineError> {
        let slot = self
            .requests
            .get_mut(mechanism.index())
            .and_then(|channels| channels.get_mut(channel as usize))
            .ok_or(RoutineError::InvalidChannel { mechanism, channel })?;
        *slot = Some(request);
        Ok(())
    }

    /// Request currently recorded for a channel.
    #[inline]
    pub fn get(&self, mechanism: MechanismId, channel: u8) -> Option<ActuatorRequest> {
        self.requests
            .get(mechanism.index())
            .and_then(|channels| channels.get(channel as usize))
            .copied()
            .flatten()
    }

    /// All recorded requests in mechanism/channel order.
    pub fn iter(&self) -> impl Iterator<Item = (MechanismId, u8, ActuatorRequest)> + '_ {
        self.requests.iter().enumerate().flat_map(|(m, channels)| {
            channels.iter().enumerate().filter_map(move |(c, req)| {
                req.map(|r| (MechanismId(m as u8), c as u8, r))
            })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

// ─── Digital inputs ─────────────────────────────────────────────────

/// Digital input (DIO) port number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigitalInputId(pub u8);

/// Digital input logic interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum DiLogic {
    /// Normally open: high means active.
    #[default]
    #[serde(rename = "NO")]
    NO = 0,
    /// Normally closed: low means active (beam broken or wire cut).
    #[serde(rename = "NC")]
    NC = 1,
}

impl DiLogic {
    /// Logical state for a raw electrical reading.
    #[inline]
    pub const fn is_active(self, raw: bool) -> bool {
        match self {
            Self::NO => raw,
            Self::NC => !raw,
        }
    }
}

impl FromStr for DiLogic {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NO" => Ok(Self::NO),
            "NC" => Ok(Self::NC),
            _ => Err(format!("unknown DiLogic: {s:?}, expected \"NO\" or \"NC\"")),
        }
    }
}

impl fmt::Display for DiLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NO => write!(f, "NO"),
            Self::NC => write!(f, "NC"),
        }
    }
}

// ─── Status ─────────────────────────────────────────────────────────

/// Everything a driver samples at the start of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct HalStatus {
    /// Operator controllers.
    pub input: InputSnapshot,
    /// Raw digital input levels.
    pub digital_inputs: [bool; MAX_DI],
}

impl Default for HalStatus {
    fn default() -> Self {
        Self {
            input: InputSnapshot::default(),
            digital_inputs: [false; MAX_DI],
        }
    }
}

impl HalStatus {
    /// Raw level of a digital input; unknown ports read low.
    #[inline]
    pub fn read_digital(&self, id: DigitalInputId) -> bool {
        self.digital_inputs
            .get(id.0 as usize)
            .copied()
            .unwrap_or(false)
    }
}
