//! Integer arithmetic opcode handlers.
//!
//! All binary operations pop the right operand first. Add, Sub, Mul,
//! and Neg wrap silently; Div and Rem raise an arithmetic fault on a
//! zero divisor instead of trapping.

use javelin_bytecode::Instruction;
use javelin_core::{value, Value};

use crate::dispatch::ControlFlow;
use crate::ops::vm_try;
use crate::vm::VirtualMachine;

/// Add: push(a + b), wrapping
#[inline(always)]
pub fn add(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let b = vm_try!(frame.pop_int());
    let a = vm_try!(frame.pop_int());
    frame.push(Value::Int(value::add(a, b)));
    ControlFlow::Continue
}

/// Sub: push(a - b), wrapping
#[inline(always)]
pub fn sub(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let b = vm_try!(frame.pop_int());
    let a = vm_try!(frame.pop_int());
    frame.push(Value::Int(value::sub(a, b)));
    ControlFlow::Continue
}

/// Mul: push(a * b), wrapping
#[inline(always)]
pub fn mul(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let b = vm_try!(frame.pop_int());
    let a = vm_try!(frame.pop_int());
    frame.push(Value::Int(value::mul(a, b)));
    ControlFlow::Continue
}

/// Div: push(a / b), truncating; faults on b == 0
#[inline(always)]
pub fn div(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let b = vm_try!(frame.pop_int());
    let a = vm_try!(frame.pop_int());
    match value::div(a, b) {
        Ok(q) => {
            frame.push(Value::Int(q));
            ControlFlow::Continue
        }
        Err(fault) => ControlFlow::Fault(fault),
    }
}

/// Rem: push(a % b); faults on b == 0
#[inline(always)]
pub fn rem(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let b = vm_try!(frame.pop_int());
    let a = vm_try!(frame.pop_int());
    match value::rem(a, b) {
        Ok(r) => {
            frame.push(Value::Int(r));
            ControlFlow::Continue
        }
        Err(fault) => ControlFlow::Fault(fault),
    }
}

/// Neg: push(-a), wrapping
#[inline(always)]
pub fn neg(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let a = vm_try!(frame.pop_int());
    frame.push(Value::Int(value::neg(a)));
    ControlFlow::Continue
}
