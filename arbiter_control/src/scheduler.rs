//! Scheduler root.
//!
//! Mechanism ownership registry, the scheduler builder and the
//! three-phase tick.

pub mod builder;
pub mod registry;
pub mod tick;
