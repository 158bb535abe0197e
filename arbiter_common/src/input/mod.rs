//! Operator input: controller snapshots and analog shaping helpers.

pub mod controller;
pub mod shaping;
