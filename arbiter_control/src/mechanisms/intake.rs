//! Ground intake: a pivoting arm with rollers.
//!
//! Pivot angles are configured in degrees and requested in mechanism
//! rotations. The pivot holds with [`GainProfile::Grounded`] only.

use arbiter_common::hal::types::{ActuatorRequest, GainProfile};
use arbiter_common::sched::error::SchedulerError;
use arbiter_common::sched::state::Flow;

use crate::config::IntakeConfig;
use crate::routine::lifecycle::Routine;

use super::INTAKE;
use super::indexer::PieceSensor;

pub const ROLLER: u8 = 0;
pub const PIVOT: u8 = 1;

#[inline]
pub fn degrees_to_rotations(deg: f64) -> f64 {
    deg / 360.0
}

fn pivot_request(deg: f64) -> ActuatorRequest {
    ActuatorRequest::Position {
        target: degrees_to_rotations(deg),
        profile: GainProfile::Grounded,
    }
}

/// Default: pivot held retracted, rollers neutral.
pub fn stow(cfg: &IntakeConfig) -> Result<Routine, SchedulerError> {
    let pivot = pivot_request(cfg.retracted_deg);
    Routine::run("intake_stow", &[INTAKE], move |ctx| {
        ctx.actuate(INTAKE, PIVOT, pivot)?;
        ctx.actuate(INTAKE, ROLLER, ActuatorRequest::Neutral)
    })
}

/// Deploy and spin the rollers; rollers idle while a piece is staged.
///
/// On stop the pivot returns to the retracted angle.
pub fn extend(cfg: &IntakeConfig, sensor: PieceSensor) -> Result<Routine, SchedulerError> {
    let extended = pivot_request(cfg.extended_deg);
    let retracted = pivot_request(cfg.retracted_deg);
    let volts = cfg.roller_volts;

    let rollers = move |present: bool| {
        if present {
            ActuatorRequest::Neutral
        } else {
            ActuatorRequest::Voltage(volts)
        }
    };

    Ok(Routine::new("intake_extend", &[INTAKE])?
        .on_start(move |ctx| {
            ctx.actuate(INTAKE, PIVOT, extended)?;
            ctx.actuate(INTAKE, ROLLER, rollers(sensor.present(ctx)))?;
            Ok(Flow::Continue)
        })
        .on_tick(move |ctx| {
            ctx.actuate(INTAKE, PIVOT, extended)?;
            ctx.actuate(INTAKE, ROLLER, rollers(sensor.present(ctx)))?;
            Ok(Flow::Continue)
        })
        .on_stop(move |ctx, _| {
            ctx.actuate(INTAKE, PIVOT, retracted)?;
            ctx.actuate(INTAKE, ROLLER, ActuatorRequest::Neutral)
        }))
}
