//! Stack-based virtual machine for Javelin bytecode.
//!
//! The VM executes [`javelin_bytecode::Program`]s: a frame stack of
//! locals and operand stacks, an arena-backed array heap, program-level
//! static fields, and a host-injected `report` callback. Recoverable
//! faults (division by zero, bad array accesses) unwind through the
//! protected-region machinery; everything else is a fatal
//! [`RuntimeError`].

pub mod dispatch;
pub mod error;
pub mod exception;
pub mod frame;
pub mod heap;
pub mod native;
pub mod ops;
pub mod vm;

pub use dispatch::ControlFlow;
pub use error::{RuntimeError, VmResult};
pub use frame::{Frame, MAX_CALL_DEPTH};
pub use heap::ArrayHeap;
pub use native::{ReportFn, Reported};
pub use vm::VirtualMachine;

use std::sync::Arc;

use javelin_bytecode::Program;

/// Run a program to completion with the given report callback.
pub fn run(program: Arc<Program>, report: ReportFn) -> VmResult<()> {
    VirtualMachine::new(program, report).execute()
}

/// Run a program to completion, collecting every reported value.
pub fn run_collecting(program: Arc<Program>) -> VmResult<Vec<i32>> {
    let (mut vm, reported) = VirtualMachine::collecting(program);
    vm.execute()?;
    Ok(reported.take())
}
