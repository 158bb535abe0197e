//! Hardware backends bundled with the control binary.
//!
//! Only the simulation backend lives here; it doubles as the test harness
//! for scripted operator sessions.

pub mod script;
pub mod sim;
