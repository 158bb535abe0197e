//! Two-arm climber under closed-loop position control.
//!
//! The arm controllers carry two gain slots: [`GainProfile::Grounded`] while
//! the arms move freely and [`GainProfile::Loaded`] while they lift the
//! robot. Every request names both target and slot, and both arms always
//! receive the same pair, so a target change can never run with the previous
//! target's gains.

use arbiter_common::hal::types::{ActuatorRequest, GainProfile};
use arbiter_common::sched::error::SchedulerError;
use arbiter_common::sched::state::Flow;

use crate::config::ClimberConfig;
use crate::routine::lifecycle::Routine;

use super::CLIMBER;

pub const LEFT_ARM: u8 = 0;
pub const RIGHT_ARM: u8 = 1;
pub const ARMS: [u8; 2] = [LEFT_ARM, RIGHT_ARM];

/// Hold both arms at `target` rotations with `profile`, from the tick the
/// routine starts.
pub fn hold(name: &'static str, target: f64, profile: GainProfile) -> Result<Routine, SchedulerError> {
    let request = ActuatorRequest::Position { target, profile };
    Ok(Routine::new(name, &[CLIMBER])?
        .on_start(move |ctx| {
            ctx.actuate_channels(CLIMBER, &ARMS, request)?;
            Ok(Flow::Continue)
        })
        .on_tick(move |ctx| {
            ctx.actuate_channels(CLIMBER, &ARMS, request)?;
            Ok(Flow::Continue)
        }))
}

/// Default: arms retracted.
pub fn retract(cfg: &ClimberConfig) -> Result<Routine, SchedulerError> {
    hold("climber_retract", cfg.retract_rot, GainProfile::Grounded)
}

pub fn extend(cfg: &ClimberConfig) -> Result<Routine, SchedulerError> {
    hold("climber_extend", cfg.extend_rot, GainProfile::Grounded)
}

/// Lift the robot: loaded gains.
pub fn pull(cfg: &ClimberConfig) -> Result<Routine, SchedulerError> {
    hold("climber_pull", cfg.pull_rot, GainProfile::Loaded)
}
