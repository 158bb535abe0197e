//! Robot container: mechanisms, defaults and operator bindings.
//!
//! | Input (operator unless noted)  | Binding          | Routine            |
//! |--------------------------------|------------------|--------------------|
//! | driver sticks                  | default          | `arcade_drive`     |
//! | left trigger > threshold       | `while_true`     | `shooter_spin`     |
//! | A                              | `while_true`     | `intake_extend`    |
//! | A                              | `while_true`     | `indexer_receive`  |
//! | B                              | `while_true`     | `indexer_feed`     |
//! | POV up                         | `toggle_on_true` | `climber_extend`   |
//! | POV down                       | `on_true`        | `climber_pull`     |
//!
//! Button A drives two routines with disjoint requirements; they run side
//! by side.

use tracing::info;

use arbiter_common::input::controller::{Axis, Buttons};
use arbiter_common::sched::error::SchedulerError;
use arbiter_common::sched::state::RoutineId;

use crate::config::ControlConfig;
use crate::mechanisms::indexer::PieceSensor;
use crate::mechanisms::{
    CLIMBER, DRIVETRAIN, INDEXER, INTAKE, SHOOTER, climber, drive, indexer, intake, shooter,
};
use crate::routine::lifecycle::Routine;
use crate::scheduler::builder::SchedulerBuilder;
use crate::scheduler::tick::Scheduler;
use crate::trigger::binder::Trigger;
use crate::trigger::sources::{axis_above, button};

/// Ids of the explicit routines, for tests and external requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotRoutines {
    pub shooter_spin: RoutineId,
    pub intake_extend: RoutineId,
    pub indexer_receive: RoutineId,
    pub indexer_feed: RoutineId,
    pub climber_extend: RoutineId,
    pub climber_pull: RoutineId,
    pub autonomous: RoutineId,
}

/// The configured robot.
#[derive(Debug)]
pub struct Robot {
    pub scheduler: Scheduler,
    pub routines: RobotRoutines,
}

impl Robot {
    pub fn build(config: &ControlConfig) -> Result<Self, SchedulerError> {
        let mut b = SchedulerBuilder::new();
        let op = config.operator.operator_port;
        let sensor = PieceSensor::from_config(&config.indexer);

        b.mechanism(DRIVETRAIN, "drivetrain")?;
        b.mechanism(INTAKE, "intake")?;
        b.mechanism(INDEXER, "indexer")?;
        b.mechanism(SHOOTER, "shooter")?;
        b.mechanism(CLIMBER, "climber")?;

        b.default_routine(DRIVETRAIN, drive::arcade_drive(&config.operator)?);
        b.default_routine(INTAKE, intake::stow(&config.intake)?);
        b.default_routine(INDEXER, indexer::idle()?);
        b.default_routine(SHOOTER, shooter::idle()?);
        b.default_routine(CLIMBER, climber::retract(&config.climber)?);

        let routines = RobotRoutines {
            shooter_spin: b.routine(shooter::spin_flywheel(&config.shooter)?)?,
            intake_extend: b.routine(intake::extend(&config.intake, sensor)?)?,
            indexer_receive: b.routine(indexer::receive_piece(&config.indexer)?)?,
            indexer_feed: b.routine(indexer::feed_piece(&config.indexer)?)?,
            climber_extend: b.routine(climber::extend(&config.climber)?)?,
            climber_pull: b.routine(climber::pull(&config.climber)?)?,
            autonomous: b.routine(autonomous()?)?,
        };

        b.trigger(
            Trigger::new(
                "shoot_trigger",
                axis_above(op, Axis::LeftTrigger, config.operator.trigger_threshold),
            )
            .while_true(routines.shooter_spin),
        );
        b.trigger(
            Trigger::new("intake_button", button(op, Buttons::A))
                .while_true(routines.intake_extend)
                .while_true(routines.indexer_receive),
        );
        b.trigger(
            Trigger::new("feed_button", button(op, Buttons::B)).while_true(routines.indexer_feed),
        );
        b.trigger(
            Trigger::new("climb_extend", button(op, Buttons::POV_UP))
                .toggle_on_true(routines.climber_extend),
        );
        b.trigger(
            Trigger::new("climb_pull", button(op, Buttons::POV_DOWN))
                .on_true(routines.climber_pull),
        );

        let scheduler = b.build()?;
        info!(service = %config.shared.service_name, "robot container ready");
        Ok(Self { scheduler, routines })
    }

    /// Queue the autonomous routine for the next tick.
    pub fn start_autonomous(&mut self) {
        self.scheduler.schedule(self.routines.autonomous);
    }
}

/// Placeholder autonomous routine: requires nothing, finishes immediately.
pub fn autonomous() -> Result<Routine, SchedulerError> {
    Routine::instant("autonomous", &[], |_| {
        info!("no autonomous routine configured");
        Ok(())
    })
}
