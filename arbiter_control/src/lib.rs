//! # Arbiter Control Library
//!
//! Cooperative, tick-driven scheduler that arbitrates exclusive access to a
//! robot's physical mechanisms among concurrently requested routines.
//!
//! ## Layers
//!
//! 1. **Routines** - three lifecycle hooks plus declared requirements
//! 2. **Registry** - one holder per mechanism, default routine as fallback
//! 3. **Scheduler** - requests → execute → backfill, once per tick
//! 4. **Triggers** - poll-and-compare edges mapped to schedule/cancel
//! 5. **Mechanisms** - drive, intake, indexer, shooter and climber policies
//!
//! The [`robot`] module wires these into the stock robot; [`cycle`] paces
//! the ticks against a [`HalDriver`](arbiter_common::hal::driver::HalDriver).
//!
//! ## Single-Threaded Core
//!
//! Every callback runs synchronously inside `Scheduler::tick`. The only
//! state shared across threads is the shutdown flag owned by the binary.

pub mod config;
pub mod cycle;
pub mod hal;
pub mod mechanisms;
pub mod robot;
pub mod routine;
pub mod scheduler;
pub mod trigger;
