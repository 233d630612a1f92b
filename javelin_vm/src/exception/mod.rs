//! Protected-region state machine and unwinding.
//!
//! Split into the per-frame state types ([`state`]) and the VM-level
//! unwind routines ([`unwind`]).

pub mod state;
pub mod unwind;

pub use state::{ActiveRegion, FaultSignal, PendingExit, RegionPhase};
