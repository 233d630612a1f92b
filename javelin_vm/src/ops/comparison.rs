//! Comparison opcode handlers.
//!
//! Each pops the right operand then the left and pushes 1 or 0.

use javelin_bytecode::Instruction;
use javelin_core::Value;

use crate::dispatch::ControlFlow;
use crate::ops::vm_try;
use crate::vm::VirtualMachine;

macro_rules! compare_op {
    ($name:ident, $op:tt, $doc:literal) => {
        #[doc = $doc]
        #[inline(always)]
        pub fn $name(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
            let frame = vm.frame_mut();
            let b = vm_try!(frame.pop_int());
            let a = vm_try!(frame.pop_int());
            frame.push(Value::Int((a $op b) as i32));
            ControlFlow::Continue
        }
    };
}

compare_op!(lt, <, "Lt: push(a < b)");
compare_op!(le, <=, "Le: push(a <= b)");
compare_op!(gt, >, "Gt: push(a > b)");
compare_op!(ge, >=, "Ge: push(a >= b)");
compare_op!(eq, ==, "Eq: push(a == b)");
compare_op!(ne, !=, "Ne: push(a != b)");
