//! Mechanism policies.
//!
//! Each submodule builds the routines for one mechanism from its config
//! section. Mechanism ids and channel assignments are fixed here.

use static_assertions::const_assert;

use arbiter_common::consts::{MAX_CHANNELS, MAX_MECHANISMS};
use arbiter_common::sched::state::MechanismId;

pub mod climber;
pub mod drive;
pub mod indexer;
pub mod intake;
pub mod shooter;

pub const DRIVETRAIN: MechanismId = MechanismId(0);
pub const INTAKE: MechanismId = MechanismId(1);
pub const INDEXER: MechanismId = MechanismId(2);
pub const SHOOTER: MechanismId = MechanismId(3);
pub const CLIMBER: MechanismId = MechanismId(4);

/// Highest channel index used by any mechanism.
const MAX_USED_CHANNEL: u8 = 1;

const_assert!((CLIMBER.0 as usize) < MAX_MECHANISMS);
const_assert!((MAX_USED_CHANNEL as usize) < MAX_CHANNELS);
