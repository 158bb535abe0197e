//! Routine root.
//!
//! Routine objects with their lifecycle hooks, and the per-tick context
//! their callbacks run against.

pub mod context;
pub mod lifecycle;
