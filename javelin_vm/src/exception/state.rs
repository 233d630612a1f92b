//! Per-frame protected-region state.
//!
//! Each `EnterRegion` pushes an [`ActiveRegion`] onto the frame. The
//! region then moves through a small state machine:
//!
//! ```text
//!            fault w/ handler
//!   Try ───────────────────────► Handler
//!    │                              │
//!    │ LeaveProtected / fault       │ LeaveProtected / fault
//!    │ (finally present)            │ (finally present)
//!    ▼                              ▼
//!  Finally ◄────────────────────────┘
//!    │
//!    │ EndFinally: resume the pending exit
//!    ▼
//!  popped
//! ```
//!
//! Whatever interrupts the region (normal completion, a fault with no
//! local handler, a return) is parked as the [`PendingExit`] while the
//! finally block runs, then resumed by `EndFinally`. A new fault or
//! return raised inside the finally block wins over the parked exit.

use std::sync::Arc;

use javelin_core::{FaultKind, Value};

/// Which part of a protected region is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionPhase {
    /// The protected body.
    Try,
    /// A handler.
    Handler,
    /// The finally block.
    Finally,
}

/// The exit parked while a finally block runs.
#[derive(Debug, Clone)]
pub enum PendingExit {
    /// Fall through to the region's exit pc.
    Complete,
    /// Resume propagating a fault.
    Signal(FaultSignal),
    /// Resume returning from the method.
    Return(Option<Value>),
}

/// A fault in flight, tagged with where it was raised.
#[derive(Debug, Clone)]
pub struct FaultSignal {
    /// What went wrong.
    pub kind: FaultKind,
    /// Method that raised it.
    pub method: Arc<str>,
    /// Instruction index of the faulting instruction.
    pub pc: u32,
}

/// One entry of a frame's active-region stack.
#[derive(Debug, Clone)]
pub struct ActiveRegion {
    /// Index into the code object's region table.
    pub region: u16,
    /// Current phase.
    pub phase: RegionPhase,
    /// Exit to resume when the finally block ends.
    pub pending: PendingExit,
    /// Operand stack depth recorded at `EnterRegion`; handlers and
    /// finally blocks start from this depth.
    pub base_stack: u32,
}

impl ActiveRegion {
    /// A freshly entered region.
    #[inline]
    pub fn enter(region: u16, base_stack: u32) -> Self {
        Self {
            region,
            phase: RegionPhase::Try,
            pending: PendingExit::Complete,
            base_stack,
        }
    }
}
