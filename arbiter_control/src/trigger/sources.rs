//! Ready-made trigger conditions.

use arbiter_common::hal::types::{DiLogic, DigitalInputId, HalStatus};
use arbiter_common::input::controller::{Axis, Buttons, ControllerPort};
use arbiter_common::input::shaping::exceeds_threshold;

/// True while every button in `buttons` is held on `port`.
pub fn button(port: ControllerPort, buttons: Buttons) -> impl FnMut(&HalStatus) -> bool + 'static {
    move |status| status.input.pressed(port, buttons)
}

/// True while `axis` on `port` is strictly above `threshold`.
pub fn axis_above(
    port: ControllerPort,
    axis: Axis,
    threshold: f64,
) -> impl FnMut(&HalStatus) -> bool + 'static {
    move |status| exceeds_threshold(status.input.axis(port, axis), threshold)
}

/// True while the digital input is logically active.
pub fn digital(id: DigitalInputId, logic: DiLogic) -> impl FnMut(&HalStatus) -> bool + 'static {
    move |status| logic.is_active(status.read_digital(id))
}
