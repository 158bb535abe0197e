//! Arbiter Common Library
//!
//! Shared types and configuration loading for all Arbiter workspace crates.
//!
//! # Module Structure
//!
//! - [`sched`] - Identifiers, routine lifecycle enums and scheduler errors
//! - [`hal`] - Hardware driver trait, actuation requests and sampled status
//! - [`input`] - Operator controller snapshot and analog shaping
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Capacity limits and defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use arbiter_common::prelude::*;
//!
//! let id = MechanismId(0);
//! assert_eq!(apply_deadband(0.05, DEFAULT_DEADBAND), 0.0);
//! # let _ = id;
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod input;
pub mod prelude;
pub mod sched;
