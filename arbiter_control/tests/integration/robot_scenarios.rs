//! Integration test: the stock robot on the simulation driver.
//!
//! Operator inputs are written straight into the driver's status, then the
//! runner executes one full cycle (read, tick, write). Assertions look at
//! the frame the scheduler produced in that cycle.

use arbiter_common::hal::driver::HalDriver;
use arbiter_common::hal::types::{ActuatorRequest, GainProfile};
use arbiter_common::input::controller::{Axis, Buttons};
use arbiter_control::config::ControlConfig;
use arbiter_control::cycle::CycleRunner;
use arbiter_control::hal::script::ScriptPlayer;
use arbiter_control::hal::sim::SimDriver;
use arbiter_control::mechanisms::{CLIMBER, DRIVETRAIN, INDEXER, INTAKE, SHOOTER};
use arbiter_control::mechanisms::{climber, drive, indexer, intake, shooter};
use arbiter_control::robot::Robot;
use arbiter_control::scheduler::registry::Holder;

use super::{DRIVER, OPERATOR, hold, robot_runner, set_axis, status};

// ── Helpers ─────────────────────────────────────────────────────────

fn position(target: f64, profile: GainProfile) -> ActuatorRequest {
    ActuatorRequest::Position { target, profile }
}

fn climber_pair(runner: &CycleRunner<SimDriver>) -> (Option<ActuatorRequest>, Option<ActuatorRequest>) {
    let frame = runner.last_frame();
    (
        frame.get(CLIMBER, climber::LEFT_ARM),
        frame.get(CLIMBER, climber::RIGHT_ARM),
    )
}

/// Both arms received exactly `expected` this cycle.
fn assert_climber(runner: &CycleRunner<SimDriver>, expected: ActuatorRequest) {
    assert_eq!(climber_pair(runner), (Some(expected), Some(expected)));
}

/// Piece in the indexer: the NC beam break reads low.
fn set_piece(runner: &mut CycleRunner<SimDriver>, present: bool) {
    status(runner).digital_inputs[0] = !present;
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn first_tick_starts_every_default() {
    let (mut runner, _) = robot_runner();
    let report = runner.step();
    assert_eq!(report.started, 5);

    let s = runner.scheduler();
    for m in [DRIVETRAIN, INTAKE, INDEXER, SHOOTER, CLIMBER] {
        assert_eq!(s.holder(m), Some(Holder::Default));
    }
    // The climber default holds from its first tick.
    assert_climber(&runner, position(0.1, GainProfile::Grounded));
}

#[test]
fn shooter_default_resumes_one_tick_after_release() {
    let (mut runner, routines) = robot_runner();
    runner.step();
    runner.step();
    let flywheel = |r: &CycleRunner<SimDriver>| r.last_frame().get(SHOOTER, shooter::FLYWHEEL);
    assert_eq!(flywheel(&runner), Some(ActuatorRequest::Neutral));

    set_axis(&mut runner, OPERATOR, Axis::LeftTrigger, 0.8);
    runner.step();
    assert!(runner.scheduler().is_scheduled(routines.shooter_spin));
    // Started this tick: first body call is next tick.
    assert_eq!(flywheel(&runner), None);
    runner.step();
    assert_eq!(flywheel(&runner), Some(ActuatorRequest::Voltage(6.0)));

    set_axis(&mut runner, OPERATOR, Axis::LeftTrigger, 0.0);
    runner.step();
    assert!(!runner.scheduler().is_scheduled(routines.shooter_spin));
    assert_eq!(runner.scheduler().holder(SHOOTER), Some(Holder::Default));
    assert_eq!(flywheel(&runner), None);
    runner.step();
    assert_eq!(flywheel(&runner), Some(ActuatorRequest::Neutral));
}

#[test]
fn trigger_at_threshold_does_not_shoot() {
    let (mut runner, routines) = robot_runner();
    runner.step();
    set_axis(&mut runner, OPERATOR, Axis::LeftTrigger, 0.5);
    runner.step();
    runner.step();
    assert!(!runner.scheduler().is_scheduled(routines.shooter_spin));

    set_axis(&mut runner, OPERATOR, Axis::LeftTrigger, 0.51);
    runner.step();
    assert!(runner.scheduler().is_scheduled(routines.shooter_spin));
}

#[test]
fn intake_button_runs_intake_and_indexer_together() {
    let (mut runner, routines) = robot_runner();
    runner.step();
    hold(&mut runner, OPERATOR, Buttons::A);
    runner.step();

    let s = runner.scheduler();
    assert!(s.is_scheduled(routines.intake_extend));
    assert!(s.is_scheduled(routines.indexer_receive));
    assert_eq!(s.holder(INTAKE), Some(Holder::Routine(routines.intake_extend)));
    assert_eq!(s.holder(INDEXER), Some(Holder::Routine(routines.indexer_receive)));

    let frame = runner.last_frame();
    assert_eq!(
        frame.get(INTAKE, intake::PIVOT),
        Some(position(0.0, GainProfile::Grounded))
    );
    assert_eq!(frame.get(INTAKE, intake::ROLLER), Some(ActuatorRequest::Voltage(3.0)));
}

#[test]
fn beam_break_stops_both_rollers_in_the_same_tick() {
    let (mut runner, _) = robot_runner();
    runner.step();
    hold(&mut runner, OPERATOR, Buttons::A);
    runner.step();
    runner.step();
    let frame = runner.last_frame();
    assert_eq!(frame.get(INTAKE, intake::ROLLER), Some(ActuatorRequest::Voltage(3.0)));
    assert_eq!(frame.get(INDEXER, indexer::ROLLER), Some(ActuatorRequest::Voltage(3.0)));

    set_piece(&mut runner, true);
    runner.step();
    let frame = runner.last_frame();
    assert_eq!(frame.get(INTAKE, intake::ROLLER), Some(ActuatorRequest::Neutral));
    assert_eq!(frame.get(INDEXER, indexer::ROLLER), Some(ActuatorRequest::Neutral));
    // Pivot stays deployed while the button is held.
    assert_eq!(
        frame.get(INTAKE, intake::PIVOT),
        Some(position(0.0, GainProfile::Grounded))
    );
}

#[test]
fn releasing_intake_button_retracts_the_pivot() {
    let (mut runner, routines) = robot_runner();
    runner.step();
    hold(&mut runner, OPERATOR, Buttons::A);
    runner.step();
    runner.step();

    hold(&mut runner, OPERATOR, Buttons::empty());
    runner.step();
    assert!(!runner.scheduler().is_scheduled(routines.intake_extend));
    let retracted = position(0.25, GainProfile::Grounded);
    let frame = runner.last_frame();
    assert_eq!(frame.get(INTAKE, intake::PIVOT), Some(retracted));
    assert_eq!(frame.get(INTAKE, intake::ROLLER), Some(ActuatorRequest::Neutral));

    runner.step();
    assert_eq!(runner.last_frame().get(INTAKE, intake::PIVOT), Some(retracted));
}

#[test]
fn climber_switches_target_and_gains_together() {
    let (mut runner, routines) = robot_runner();
    runner.step();
    runner.step();

    hold(&mut runner, OPERATOR, Buttons::POV_UP);
    runner.step();
    assert!(runner.scheduler().is_scheduled(routines.climber_extend));
    assert_climber(&runner, position(50.0, GainProfile::Grounded));

    hold(&mut runner, OPERATOR, Buttons::empty());
    runner.step();
    assert_climber(&runner, position(50.0, GainProfile::Grounded));

    hold(&mut runner, OPERATOR, Buttons::POV_DOWN);
    runner.step();
    assert!(!runner.scheduler().is_scheduled(routines.climber_extend));
    assert!(runner.scheduler().is_scheduled(routines.climber_pull));
    assert_climber(&runner, position(20.0, GainProfile::Loaded));

    // on_true: releasing does not cancel the pull.
    hold(&mut runner, OPERATOR, Buttons::empty());
    runner.step();
    assert_climber(&runner, position(20.0, GainProfile::Loaded));

    let left = runner.driver().motor(CLIMBER, climber::LEFT_ARM).unwrap();
    assert_eq!(left.gain_slot(), Some(GainProfile::Loaded.slot()));

    // Toggle memory is stale after the interruption; the next press schedules.
    hold(&mut runner, OPERATOR, Buttons::POV_UP);
    runner.step();
    assert!(runner.scheduler().is_scheduled(routines.climber_extend));
    assert_climber(&runner, position(50.0, GainProfile::Grounded));
}

#[test]
fn climber_arms_never_diverge() {
    let (mut runner, _) = robot_runner();
    let presses = [
        Buttons::empty(),
        Buttons::POV_UP,
        Buttons::empty(),
        Buttons::POV_DOWN,
        Buttons::POV_UP,
        Buttons::empty(),
        Buttons::POV_UP,
        Buttons::empty(),
        Buttons::POV_DOWN,
    ];
    for buttons in presses {
        hold(&mut runner, OPERATOR, buttons);
        runner.step();
        let (left, right) = climber_pair(&runner);
        assert_eq!(left, right);
    }
}

#[test]
fn arcade_drive_mixes_and_desaturates() {
    let (mut runner, _) = robot_runner();
    runner.step();
    // Full forward (stick Y is inverted) plus half turn.
    set_axis(&mut runner, DRIVER, Axis::LeftY, -1.0);
    set_axis(&mut runner, DRIVER, Axis::RightX, 0.5);
    runner.step();

    let frame = runner.last_frame();
    let expected = drive::arcade(1.0, 0.5);
    assert_eq!(frame.get(DRIVETRAIN, drive::LEFT), Some(ActuatorRequest::Output(expected.left)));
    assert_eq!(frame.get(DRIVETRAIN, drive::RIGHT), Some(ActuatorRequest::Output(expected.right)));
    assert!((expected.left - 1.0).abs() < 1e-12);
    assert!((expected.right - (-0.5 / 1.5)).abs() < 1e-12);
}

#[test]
fn stick_noise_inside_deadband_drives_nothing() {
    let (mut runner, _) = robot_runner();
    runner.step();
    set_axis(&mut runner, DRIVER, Axis::LeftY, 0.05);
    set_axis(&mut runner, DRIVER, Axis::RightX, -0.09);
    runner.step();
    let frame = runner.last_frame();
    assert_eq!(frame.get(DRIVETRAIN, drive::LEFT), Some(ActuatorRequest::Output(0.0)));
    assert_eq!(frame.get(DRIVETRAIN, drive::RIGHT), Some(ActuatorRequest::Output(0.0)));
}

#[test]
fn autonomous_runs_once_without_touching_mechanisms() {
    let config = ControlConfig::default();
    let mut robot = Robot::build(&config).unwrap();
    let auto = robot.routines.autonomous;
    robot.start_autonomous();
    let mut runner = CycleRunner::new(robot.scheduler, SimDriver::new(20), &config.cycle);

    let report = runner.step();
    assert_eq!(report.completed, 1);
    assert!(!runner.scheduler().is_scheduled(auto));
    assert_eq!(runner.scheduler().routine(auto).unwrap().starts(), 1);
    for m in [DRIVETRAIN, INTAKE, INDEXER, SHOOTER, CLIMBER] {
        assert_eq!(runner.scheduler().holder(m), Some(Holder::Default));
    }
}

#[test]
fn scripted_session_plays_through_the_runner() {
    let script = ScriptPlayer::from_toml_str(
        r#"
        [[step]]
        tick = 3
        port = 1
        buttons = ["A"]

        [[step]]
        tick = 6
        port = 1
        buttons = []
        axes = { left_trigger = 0.9 }

        [[step]]
        tick = 9
        port = 1
        axes = { left_trigger = 0.0 }
        "#,
    )
    .unwrap();

    let config = ControlConfig::default();
    let robot = Robot::build(&config).unwrap();
    let routines = robot.routines;
    let mut driver = SimDriver::new(config.cycle.period_ms).with_script(script);
    driver.status_mut().digital_inputs[0] = true;
    let mut runner = CycleRunner::new(robot.scheduler, driver, &config.cycle);

    let mut intake_ticks = 0;
    let mut shooter_ticks = 0;
    for _ in 0..12 {
        runner.step();
        let s = runner.scheduler();
        intake_ticks += u32::from(s.is_scheduled(routines.intake_extend));
        shooter_ticks += u32::from(s.is_scheduled(routines.shooter_spin));
    }
    assert_eq!(intake_ticks, 3);
    assert_eq!(shooter_ticks, 3);
    assert!(runner.driver().script_finished());
    assert_eq!(runner.driver().diagnostics().unwrap().frames_written, 12);

    runner.finish().unwrap();
    let flywheel = runner.driver().motor(SHOOTER, shooter::FLYWHEEL).unwrap();
    assert_eq!(flywheel.last_request(), Some(ActuatorRequest::Neutral));
}

#[test]
fn shipped_config_matches_stock_values() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../config");
    let config = arbiter_control::config::load_config(&root.join("arbiter.toml")).unwrap();
    assert_eq!(config, ControlConfig::default());

    let script = ScriptPlayer::load(&root.join("demo_script.toml")).unwrap();
    assert!(!script.is_empty());
}
