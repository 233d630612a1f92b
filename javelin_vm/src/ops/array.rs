//! Array opcode handlers.
//!
//! Arrays are heap-allocated with reference semantics; the opcodes
//! validate indices and sizes here, turning violations into
//! recoverable faults. A handle the heap never issued is a fatal
//! error: interpreted code has no way to forge one.

use javelin_bytecode::Instruction;
use javelin_core::{FaultKind, Value};

use crate::dispatch::ControlFlow;
use crate::error::RuntimeError;
use crate::ops::vm_try;
use crate::vm::VirtualMachine;

/// NewArray: len = pop, push(new int[len]); faults on negative len
#[inline(always)]
pub fn new_array(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let len = vm_try!(vm.frame_mut().pop_int());
    if len < 0 {
        return ControlFlow::Fault(FaultKind::NegativeArraySize { size: len });
    }
    let handle = vm.heap.alloc(len as usize);
    vm.frame_mut().push(Value::Array(handle));
    ControlFlow::Continue
}

/// ArrayLoad: idx = pop, ref = pop, push(ref[idx])
#[inline(always)]
pub fn array_load(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let index = vm_try!(frame.pop_int());
    let handle = vm_try!(frame.pop_array());

    let Some(elems) = vm.heap.get(handle) else {
        return ControlFlow::Fatal(RuntimeError::bad_array_ref(handle.0));
    };
    let length = elems.len() as u32;
    if index < 0 || index as u32 >= length {
        return ControlFlow::Fault(FaultKind::IndexOutOfBounds { index, length });
    }

    let value = elems[index as usize];
    vm.frame_mut().push(Value::Int(value));
    ControlFlow::Continue
}

/// ArrayStore: val = pop, idx = pop, ref = pop, ref[idx] = val
#[inline(always)]
pub fn array_store(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let value = vm_try!(frame.pop_int());
    let index = vm_try!(frame.pop_int());
    let handle = vm_try!(frame.pop_array());

    let Some(elems) = vm.heap.get_mut(handle) else {
        return ControlFlow::Fatal(RuntimeError::bad_array_ref(handle.0));
    };
    let length = elems.len() as u32;
    if index < 0 || index as u32 >= length {
        return ControlFlow::Fault(FaultKind::IndexOutOfBounds { index, length });
    }

    elems[index as usize] = value;
    ControlFlow::Continue
}

/// ArrayLength: ref = pop, push(ref.length)
#[inline(always)]
pub fn array_length(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let handle = vm_try!(vm.frame_mut().pop_array());
    let Some(elems) = vm.heap.get(handle) else {
        return ControlFlow::Fatal(RuntimeError::bad_array_ref(handle.0));
    };
    let length = elems.len() as i32;
    vm.frame_mut().push(Value::Int(length));
    ControlFlow::Continue
}
