//! Scripted operator input for the simulation driver.
//!
//! A script is a TOML list of steps. Each step fires once, at the start of
//! its tick, and changes only what it names:
//!
//! ```toml
//! [[step]]
//! tick = 50
//! port = 1
//! buttons = ["A"]          # replaces the held-button set
//!
//! [[step]]
//! tick = 90
//! port = 1
//! buttons = []
//! axes = { left_trigger = 0.9 }
//!
//! [[step]]
//! tick = 70
//! digital = { "0" = false }  # raw input level
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use arbiter_common::config::{ConfigError, ConfigLoader};
use arbiter_common::consts::{MAX_CONTROLLERS, MAX_DI};
use arbiter_common::hal::types::HalStatus;
use arbiter_common::input::controller::{Axis, Buttons, ControllerPort};

/// Raw step as written in TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptStep {
    pub tick: u64,
    #[serde(default)]
    pub port: u8,
    pub buttons: Option<Vec<String>>,
    #[serde(default)]
    pub axes: BTreeMap<String, f64>,
    #[serde(default)]
    pub digital: BTreeMap<String, bool>,
}

/// Raw script document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputScript {
    #[serde(default, rename = "step")]
    pub steps: Vec<ScriptStep>,
}

/// Validated step.
#[derive(Debug, Clone, PartialEq)]
struct ScriptEvent {
    tick: u64,
    port: ControllerPort,
    buttons: Option<Buttons>,
    axes: Vec<(Axis, f64)>,
    digital: Vec<(usize, bool)>,
}

impl ScriptEvent {
    fn apply(&self, status: &mut HalStatus) {
        if let Some(pad) = status.input.controller_mut(self.port) {
            if let Some(buttons) = self.buttons {
                pad.buttons = buttons;
            }
            for &(axis, value) in &self.axes {
                pad.axes[axis.index()] = value;
            }
        }
        for &(port, level) in &self.digital {
            status.digital_inputs[port] = level;
        }
    }
}

fn invalid(tick: u64, msg: String) -> ConfigError {
    ConfigError::ValidationError(format!("script step at tick {tick}: {msg}"))
}

impl TryFrom<ScriptStep> for ScriptEvent {
    type Error = ConfigError;

    fn try_from(step: ScriptStep) -> Result<Self, Self::Error> {
        let tick = step.tick;
        if step.port as usize >= MAX_CONTROLLERS {
            return Err(invalid(tick, format!("port {} out of range", step.port)));
        }

        let buttons = step
            .buttons
            .map(|names| {
                names.iter().try_fold(Buttons::empty(), |acc, name| {
                    Buttons::from_name(name)
                        .map(|b| acc | b)
                        .ok_or_else(|| invalid(tick, format!("unknown button {name:?}")))
                })
            })
            .transpose()?;

        let axes = step
            .axes
            .iter()
            .map(|(name, &value)| {
                let axis: Axis = name.parse().map_err(|e: String| invalid(tick, e))?;
                if !(-1.0..=1.0).contains(&value) {
                    return Err(invalid(tick, format!("{name} = {value} outside [-1, 1]")));
                }
                Ok((axis, value))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let digital = step
            .digital
            .iter()
            .map(|(port, &level)| match port.parse::<usize>() {
                Ok(p) if p < MAX_DI => Ok((p, level)),
                _ => Err(invalid(tick, format!("bad digital input {port:?}"))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tick,
            port: ControllerPort(step.port),
            buttons,
            axes,
            digital,
        })
    }
}

/// Replays a validated script in tick order.
#[derive(Debug, Clone, Default)]
pub struct ScriptPlayer {
    events: Vec<ScriptEvent>,
    cursor: usize,
}

impl ScriptPlayer {
    pub fn compile(script: InputScript) -> Result<Self, ConfigError> {
        let mut events = script
            .steps
            .into_iter()
            .map(ScriptEvent::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        // Stable: steps sharing a tick apply in file order.
        events.sort_by_key(|e| e.tick);
        Ok(Self { events, cursor: 0 })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::compile(InputScript::from_toml_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::compile(InputScript::load(path)?)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// True once every step has fired.
    pub fn finished(&self) -> bool {
        self.cursor >= self.events.len()
    }

    /// Apply every step due at or before `tick`.
    pub fn advance(&mut self, tick: u64, status: &mut HalStatus) {
        while let Some(event) = self.events.get(self.cursor) {
            if event.tick > tick {
                break;
            }
            debug!(tick = event.tick, port = event.port.0, "script step");
            event.apply(status);
            self.cursor += 1;
        }
    }
}
