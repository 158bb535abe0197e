//! Arcade drive for a two-sided (tank) drivetrain.
//!
//! `forward` and `turn` are mixed into left/right outputs, then scaled down
//! together if either side would exceed full output. Scaling keeps the
//! left/right ratio, so the robot still turns along the commanded arc.

use arbiter_common::hal::types::ActuatorRequest;
use arbiter_common::input::controller::{Axis, ControllerPort, InputSnapshot};
use arbiter_common::input::shaping::apply_deadband;
use arbiter_common::sched::error::SchedulerError;

use crate::config::OperatorConfig;
use crate::routine::lifecycle::Routine;

use super::DRIVETRAIN;

pub const LEFT: u8 = 0;
pub const RIGHT: u8 = 1;

/// Per-side output fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelSpeeds {
    pub left: f64,
    pub right: f64,
}

/// Scale both sides by the larger magnitude when it exceeds 1.
pub fn desaturate(speeds: WheelSpeeds) -> WheelSpeeds {
    let max = speeds.left.abs().max(speeds.right.abs());
    if max > 1.0 {
        WheelSpeeds {
            left: speeds.left / max,
            right: speeds.right / max,
        }
    } else {
        speeds
    }
}

/// Mix forward and turn commands. The right side is mounted mirrored.
pub fn arcade(forward: f64, turn: f64) -> WheelSpeeds {
    desaturate(WheelSpeeds {
        left: forward + turn,
        right: -forward + turn,
    })
}

/// Shaped driver commands: inverted left stick Y forward, right stick X turn.
pub fn driver_command(input: &InputSnapshot, port: ControllerPort, deadband: f64) -> (f64, f64) {
    let forward = apply_deadband(-input.axis(port, Axis::LeftY), deadband);
    let turn = apply_deadband(input.axis(port, Axis::RightX), deadband);
    (forward, turn)
}

/// Default drivetrain routine: arcade drive from the driver controller.
pub fn arcade_drive(operator: &OperatorConfig) -> Result<Routine, SchedulerError> {
    let port = operator.driver_port;
    let deadband = operator.deadband;
    Routine::run("arcade_drive", &[DRIVETRAIN], move |ctx| {
        let (forward, turn) = driver_command(ctx.input(), port, deadband);
        let speeds = arcade(forward, turn);
        ctx.actuate(DRIVETRAIN, LEFT, ActuatorRequest::Output(speeds.left))?;
        ctx.actuate(DRIVETRAIN, RIGHT, ActuatorRequest::Output(speeds.right))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn desaturate_is_identity_within_range() {
        for &(l, r) in &[(0.0, 0.0), (1.0, -1.0), (0.3, 0.7), (-0.99, 0.5)] {
            let s = WheelSpeeds { left: l, right: r };
            assert_eq!(desaturate(s), s);
        }
    }

    #[test]
    fn desaturate_caps_at_one_and_keeps_ratio() {
        for &(l, r) in &[(1.5, 0.5), (-2.0, 1.0), (0.4, -1.6), (3.0, 3.0)] {
            let s = desaturate(WheelSpeeds { left: l, right: r });
            let max = s.left.abs().max(s.right.abs());
            assert!((max - 1.0).abs() < EPS, "max {max} for ({l}, {r})");
            assert!((s.left * r - s.right * l).abs() < EPS, "ratio changed for ({l}, {r})");
        }
    }

    #[test]
    fn arcade_mixing() {
        assert_eq!(arcade(0.5, 0.0), WheelSpeeds { left: 0.5, right: -0.5 });
        assert_eq!(arcade(0.0, 0.5), WheelSpeeds { left: 0.5, right: 0.5 });
        let full = arcade(1.0, 1.0);
        assert_eq!(full, WheelSpeeds { left: 1.0, right: 0.0 });
    }

    #[test]
    fn driver_command_applies_deadband_and_inversion() {
        let port = ControllerPort(0);
        let mut input = InputSnapshot::default();
        let pad = input.controller_mut(port).unwrap();
        pad.axes[Axis::LeftY.index()] = -0.6;
        pad.axes[Axis::RightX.index()] = 0.05;
        assert_eq!(driver_command(&input, port, 0.1), (0.6, 0.0));
    }
}
