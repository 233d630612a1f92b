//! Stack and variable access opcode handlers.

use javelin_bytecode::Instruction;
use javelin_core::Value;

use crate::dispatch::ControlFlow;
use crate::ops::vm_try;
use crate::vm::VirtualMachine;

/// LoadConst: push consts[imm16]
#[inline(always)]
pub fn load_const(vm: &mut VirtualMachine, inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let value = vm_try!(frame.get_const(inst.imm16()));
    frame.push(Value::Int(value));
    ControlFlow::Continue
}

/// PushSmall: push the sign-extended 16-bit immediate
#[inline(always)]
pub fn push_small(vm: &mut VirtualMachine, inst: Instruction) -> ControlFlow {
    vm.frame_mut().push(Value::Int(inst.offset() as i32));
    ControlFlow::Continue
}

/// LoadLocal: push locals[imm16]
#[inline(always)]
pub fn load_local(vm: &mut VirtualMachine, inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let value = vm_try!(frame.get_local(inst.imm16()));
    frame.push(value);
    ControlFlow::Continue
}

/// StoreLocal: locals[imm16] = pop
#[inline(always)]
pub fn store_local(vm: &mut VirtualMachine, inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let value = vm_try!(frame.pop());
    vm_try!(frame.set_local(inst.imm16(), value));
    ControlFlow::Continue
}

/// GetStatic: push statics[imm16]
#[inline(always)]
pub fn get_static(vm: &mut VirtualMachine, inst: Instruction) -> ControlFlow {
    let value = vm_try!(vm.get_static(inst.imm16()));
    vm.frame_mut().push(Value::Int(value));
    ControlFlow::Continue
}

/// PutStatic: statics[imm16] = pop
#[inline(always)]
pub fn put_static(vm: &mut VirtualMachine, inst: Instruction) -> ControlFlow {
    let value = vm_try!(vm.frame_mut().pop_int());
    vm_try!(vm.set_static(inst.imm16(), value));
    ControlFlow::Continue
}

/// Dup: duplicate the top of stack
#[inline(always)]
pub fn dup(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let top = vm_try!(frame.peek());
    frame.push(top);
    ControlFlow::Continue
}

/// Pop: discard the top of stack
#[inline(always)]
pub fn pop(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    vm_try!(vm.frame_mut().pop());
    ControlFlow::Continue
}
