//! Flywheel shooter.

use arbiter_common::hal::types::ActuatorRequest;
use arbiter_common::sched::error::SchedulerError;

use crate::config::ShooterConfig;
use crate::routine::lifecycle::Routine;

use super::SHOOTER;

pub const FLYWHEEL: u8 = 0;

/// Default: flywheel neutral to save battery.
pub fn idle() -> Result<Routine, SchedulerError> {
    Routine::run("shooter_idle", &[SHOOTER], |ctx| {
        ctx.actuate(SHOOTER, FLYWHEEL, ActuatorRequest::Neutral)
    })
}

pub fn spin_flywheel(cfg: &ShooterConfig) -> Result<Routine, SchedulerError> {
    let volts = cfg.shoot_volts;
    Routine::run("shooter_spin", &[SHOOTER], move |ctx| {
        ctx.actuate(SHOOTER, FLYWHEEL, ActuatorRequest::Voltage(volts))
    })
}
