//! Operator controller snapshot types.
//!
//! The driver samples every controller once per tick into an
//! [`InputSnapshot`]; triggers and routines only ever see that snapshot.

use bitflags::bitflags;
use core::str::FromStr;

use crate::consts::{AXES_PER_CONTROLLER, MAX_CONTROLLERS};

bitflags! {
    /// Digital buttons of a gamepad-style controller, D-pad included.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Buttons: u16 {
        const A            = 0x0001;
        const B            = 0x0002;
        const X            = 0x0004;
        const Y            = 0x0008;
        const LEFT_BUMPER  = 0x0010;
        const RIGHT_BUMPER = 0x0020;
        const BACK         = 0x0040;
        const START        = 0x0080;
        const LEFT_STICK   = 0x0100;
        const RIGHT_STICK  = 0x0200;
        const POV_UP       = 0x0400;
        const POV_RIGHT    = 0x0800;
        const POV_DOWN     = 0x1000;
        const POV_LEFT     = 0x2000;
    }
}

impl Default for Buttons {
    fn default() -> Self {
        Self::empty()
    }
}

/// Analog axes. Sticks report [-1, 1], triggers report [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Axis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
    LeftTrigger = 4,
    RightTrigger = 5,
}

impl Axis {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for Axis {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left_x" => Ok(Self::LeftX),
            "left_y" => Ok(Self::LeftY),
            "right_x" => Ok(Self::RightX),
            "right_y" => Ok(Self::RightY),
            "left_trigger" => Ok(Self::LeftTrigger),
            "right_trigger" => Ok(Self::RightTrigger),
            _ => Err(format!("unknown axis: {s:?}")),
        }
    }
}

/// Driver-station port a controller is plugged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ControllerPort(pub u8);

/// One controller's sampled state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerState {
    pub buttons: Buttons,
    pub axes: [f64; AXES_PER_CONTROLLER],
}

impl ControllerState {
    /// Axis value clamped to [-1, 1].
    #[inline]
    pub fn axis(&self, axis: Axis) -> f64 {
        self.axes[axis.index()].clamp(-1.0, 1.0)
    }

    /// True when every button in `buttons` is held.
    #[inline]
    pub fn pressed(&self, buttons: Buttons) -> bool {
        self.buttons.contains(buttons)
    }
}

/// Per-tick snapshot of all operator controllers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSnapshot {
    pub controllers: [ControllerState; MAX_CONTROLLERS],
}

impl InputSnapshot {
    /// State of the controller on `port`, if that port exists.
    #[inline]
    pub fn controller(&self, port: ControllerPort) -> Option<&ControllerState> {
        self.controllers.get(port.0 as usize)
    }

    /// Mutable access for drivers and test fixtures.
    #[inline]
    pub fn controller_mut(&mut self, port: ControllerPort) -> Option<&mut ControllerState> {
        self.controllers.get_mut(port.0 as usize)
    }

    /// Axis value; an unplugged port reads as centered.
    #[inline]
    pub fn axis(&self, port: ControllerPort, axis: Axis) -> f64 {
        self.controller(port).map_or(0.0, |c| c.axis(axis))
    }

    /// Button state; an unplugged port reads as released.
    #[inline]
    pub fn pressed(&self, port: ControllerPort, buttons: Buttons) -> bool {
        self.controller(port).is_some_and(|c| c.pressed(buttons))
    }
}
