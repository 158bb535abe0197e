//! System-wide constants for the Arbiter workspace.
//!
//! Single source of truth for all capacity limits and default paths.
//! Imported by all crates; values are not duplicated elsewhere.

use static_assertions::const_assert;

/// Maximum number of mechanisms (registry slots).
pub const MAX_MECHANISMS: usize = 16;

/// Maximum number of actuation channels (motor groups) per mechanism.
pub const MAX_CHANNELS: usize = 4;

/// Maximum number of mechanisms a single routine may require.
pub const MAX_REQUIREMENTS: usize = 8;

/// Maximum number of digital inputs exposed by a driver.
pub const MAX_DI: usize = 32;

/// Number of operator controllers sampled every tick.
pub const MAX_CONTROLLERS: usize = 2;

/// Number of analog axes per controller.
pub const AXES_PER_CONTROLLER: usize = 6;

/// Default scheduler tick period in milliseconds (50 Hz).
pub const DEFAULT_TICK_PERIOD_MS: u32 = 20;

/// Default stick deadband applied to analog driver inputs.
pub const DEFAULT_DEADBAND: f64 = 0.1;

/// Default threshold converting an analog axis into a boolean trigger.
pub const DEFAULT_AXIS_THRESHOLD: f64 = 0.5;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/arbiter.toml";

const_assert!(MAX_REQUIREMENTS <= MAX_MECHANISMS);
const_assert!(MAX_MECHANISMS <= u8::MAX as usize);
const_assert!(MAX_CHANNELS <= u8::MAX as usize);
const_assert!(MAX_DI <= u8::MAX as usize);
