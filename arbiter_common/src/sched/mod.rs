//! Scheduler shared types.
//!
//! Identifiers, lifecycle enums and error types shared between the
//! scheduler core and anything that builds or inspects routines.

pub mod error;
pub mod state;
