//! Hardware abstraction layer interface.
//!
//! Driver trait plus the request/status types exchanged with it once per
//! tick.

pub mod driver;
pub mod types;
