//! Control flow opcode handlers.
//!
//! Jumps, conditional branches, and returns. Returns surface as
//! `ControlFlow::Return` so the dispatch loop can route them through
//! any finally blocks still active in the frame.

use javelin_bytecode::Instruction;

use crate::dispatch::ControlFlow;
use crate::ops::vm_try;
use crate::vm::VirtualMachine;

/// Nop: do nothing
#[inline(always)]
pub fn nop(_vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    ControlFlow::Continue
}

/// Jump: unconditional jump by signed 16-bit offset
#[inline(always)]
pub fn jump(_vm: &mut VirtualMachine, inst: Instruction) -> ControlFlow {
    ControlFlow::Jump(inst.offset())
}

/// JumpIfFalse: pop condition, jump if zero
#[inline(always)]
pub fn jump_if_false(vm: &mut VirtualMachine, inst: Instruction) -> ControlFlow {
    let value = vm_try!(vm.frame_mut().pop());
    if !value.is_truthy() {
        ControlFlow::Jump(inst.offset())
    } else {
        ControlFlow::Continue
    }
}

/// JumpIfTrue: pop condition, jump if non-zero
#[inline(always)]
pub fn jump_if_true(vm: &mut VirtualMachine, inst: Instruction) -> ControlFlow {
    let value = vm_try!(vm.frame_mut().pop());
    if value.is_truthy() {
        ControlFlow::Jump(inst.offset())
    } else {
        ControlFlow::Continue
    }
}

/// Return: pop the return value and leave the frame
#[inline(always)]
pub fn return_value(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let value = vm_try!(vm.frame_mut().pop());
    ControlFlow::Return(Some(value))
}

/// ReturnVoid: leave the frame with no return value
#[inline(always)]
pub fn return_void(_vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    ControlFlow::Return(None)
}
