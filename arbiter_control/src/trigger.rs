//! Trigger root.
//!
//! Edge detection, bindings from edges to schedule/cancel requests, and
//! ready-made conditions over operator input and digital sensors.

pub mod binder;
pub mod edge;
pub mod sources;
