//! Call and native opcode handlers.

use javelin_bytecode::Instruction;

use crate::dispatch::ControlFlow;
use crate::ops::vm_try;
use crate::vm::VirtualMachine;

/// Call: push a frame for method imm16
///
/// The callee's arguments are on this frame's stack; the VM moves them
/// into the new frame's parameter slots when it pushes the frame.
#[inline(always)]
pub fn call(_vm: &mut VirtualMachine, inst: Instruction) -> ControlFlow {
    ControlFlow::Call {
        method: inst.imm16(),
    }
}

/// Report: pop a value and hand it to the host callback
#[inline(always)]
pub fn report(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let value = vm_try!(vm.frame_mut().pop_int());
    vm.report_value(value);
    ControlFlow::Continue
}
