//! Shared fixtures for the integration suites.

mod bindings;
mod ownership;
mod robot_scenarios;

use arbiter_common::hal::types::HalStatus;
use arbiter_common::input::controller::{Axis, Buttons, ControllerPort};
use arbiter_control::config::ControlConfig;
use arbiter_control::cycle::CycleRunner;
use arbiter_control::hal::sim::SimDriver;
use arbiter_control::robot::{Robot, RobotRoutines};

pub const DRIVER: ControllerPort = ControllerPort(0);
pub const OPERATOR: ControllerPort = ControllerPort(1);

/// Stock robot on the simulation driver, beam break intact (no piece).
pub fn robot_runner() -> (CycleRunner<SimDriver>, RobotRoutines) {
    let config = ControlConfig::default();
    let robot = Robot::build(&config).expect("stock robot builds");
    let routines = robot.routines;
    let mut driver = SimDriver::new(config.cycle.period_ms);
    // NC beam break: high while nothing blocks it.
    driver.status_mut().digital_inputs[0] = true;
    (CycleRunner::new(robot.scheduler, driver, &config.cycle), routines)
}

pub fn status(runner: &mut CycleRunner<SimDriver>) -> &mut HalStatus {
    runner.driver_mut().status_mut()
}

pub fn hold(runner: &mut CycleRunner<SimDriver>, port: ControllerPort, buttons: Buttons) {
    if let Some(pad) = status(runner).input.controller_mut(port) {
        pad.buttons = buttons;
    }
}

pub fn set_axis(runner: &mut CycleRunner<SimDriver>, port: ControllerPort, axis: Axis, value: f64) {
    if let Some(pad) = status(runner).input.controller_mut(port) {
        pad.axes[axis.index()] = value;
    }
}
