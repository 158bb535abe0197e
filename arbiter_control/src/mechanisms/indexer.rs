//! Indexer: stages game pieces between the intake and the shooter.
//!
//! A beam break at the shooter end of the indexer reports whether a piece
//! is staged. While receiving, the rollers stop as soon as the beam breaks.

use arbiter_common::hal::types::{ActuatorRequest, DiLogic, DigitalInputId};
use arbiter_common::sched::error::SchedulerError;

use crate::config::IndexerConfig;
use crate::routine::context::RoutineContext;
use crate::routine::lifecycle::Routine;

use super::INDEXER;

pub const ROLLER: u8 = 0;

/// Beam-break piece sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSensor {
    pub input: DigitalInputId,
    pub logic: DiLogic,
}

impl PieceSensor {
    pub fn from_config(cfg: &IndexerConfig) -> Self {
        Self {
            input: cfg.beam_break_port,
            logic: cfg.beam_break_logic,
        }
    }

    /// True while a piece interrupts the beam.
    #[inline]
    pub fn present(&self, ctx: &RoutineContext<'_>) -> bool {
        self.logic.is_active(ctx.read_digital(self.input))
    }
}

/// Default: rollers neutral.
pub fn idle() -> Result<Routine, SchedulerError> {
    Routine::run("indexer_idle", &[INDEXER], |ctx| {
        ctx.actuate(INDEXER, ROLLER, ActuatorRequest::Neutral)
    })
}

/// Pull a piece in, holding neutral once the beam breaks.
pub fn receive_piece(cfg: &IndexerConfig) -> Result<Routine, SchedulerError> {
    let sensor = PieceSensor::from_config(cfg);
    let volts = cfg.receive_volts;
    Routine::run("indexer_receive", &[INDEXER], move |ctx| {
        let request = if sensor.present(ctx) {
            ActuatorRequest::Neutral
        } else {
            ActuatorRequest::Voltage(volts)
        };
        ctx.actuate(INDEXER, ROLLER, request)
    })
}

/// Push the staged piece into the shooter.
pub fn feed_piece(cfg: &IndexerConfig) -> Result<Routine, SchedulerError> {
    let volts = cfg.feed_volts;
    Routine::run("indexer_feed", &[INDEXER], move |ctx| {
        ctx.actuate(INDEXER, ROLLER, ActuatorRequest::Voltage(volts))
    })
}
