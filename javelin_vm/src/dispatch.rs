//! Dispatch table and control-flow results.
//!
//! Uses a static function pointer table for O(1) opcode dispatch.
//! Each opcode maps to a handler function that returns control flow.

use javelin_bytecode::Instruction;
use javelin_core::{FaultKind, Value};

use crate::error::RuntimeError;
use crate::vm::VirtualMachine;

/// Control flow result from opcode execution.
///
/// This enum represents all possible control flow outcomes from
/// executing a bytecode instruction. The VM dispatch loop uses this to
/// determine what action to take next.
#[derive(Debug, Clone)]
pub enum ControlFlow {
    // =========================================================================
    // Normal Execution
    // =========================================================================
    /// Continue to next instruction.
    Continue,

    /// Relative jump by signed offset.
    Jump(i16),

    /// Push a new frame for the method with this id.
    Call { method: u16 },

    /// Leave the current frame, handing an optional value to the caller.
    ///
    /// Routed through [`VirtualMachine::unwind_return`] so the frame's
    /// remaining finally blocks run first.
    Return(Option<Value>),

    // =========================================================================
    // Fault Handling
    // =========================================================================
    /// Raise a recoverable fault.
    ///
    /// The VM tags it with the raise site and starts unwinding through
    /// the active protected regions.
    Fault(FaultKind),

    /// Fatal error; execution stops.
    Fatal(RuntimeError),
}

/// Opcode handler function signature.
pub type OpHandler = fn(&mut VirtualMachine, Instruction) -> ControlFlow;

/// Invalid opcode handler.
fn op_invalid(_vm: &mut VirtualMachine, inst: Instruction) -> ControlFlow {
    ControlFlow::Fatal(RuntimeError::invalid_opcode(inst.opcode()))
}

use crate::ops::arithmetic;
use crate::ops::array;
use crate::ops::calls;
use crate::ops::comparison;
use crate::ops::control;
use crate::ops::load_store;
use crate::ops::region;

use javelin_bytecode::Opcode;

/// Build the static dispatch table.
/// Returns array of 256 function pointers indexed by opcode.
const fn build_dispatch_table() -> [OpHandler; 256] {
    let mut table: [OpHandler; 256] = [op_invalid; 256];

    // Control Flow (0x00-0x0F)
    table[Opcode::Nop as usize] = control::nop;
    table[Opcode::Jump as usize] = control::jump;
    table[Opcode::JumpIfFalse as usize] = control::jump_if_false;
    table[Opcode::JumpIfTrue as usize] = control::jump_if_true;
    table[Opcode::Return as usize] = control::return_value;
    table[Opcode::ReturnVoid as usize] = control::return_void;

    // Stack and Variable Access (0x10-0x1F)
    table[Opcode::LoadConst as usize] = load_store::load_const;
    table[Opcode::PushSmall as usize] = load_store::push_small;
    table[Opcode::LoadLocal as usize] = load_store::load_local;
    table[Opcode::StoreLocal as usize] = load_store::store_local;
    table[Opcode::GetStatic as usize] = load_store::get_static;
    table[Opcode::PutStatic as usize] = load_store::put_static;
    table[Opcode::Dup as usize] = load_store::dup;
    table[Opcode::Pop as usize] = load_store::pop;

    // Integer Arithmetic (0x20-0x2F)
    table[Opcode::Add as usize] = arithmetic::add;
    table[Opcode::Sub as usize] = arithmetic::sub;
    table[Opcode::Mul as usize] = arithmetic::mul;
    table[Opcode::Div as usize] = arithmetic::div;
    table[Opcode::Rem as usize] = arithmetic::rem;
    table[Opcode::Neg as usize] = arithmetic::neg;

    // Comparison (0x30-0x3F)
    table[Opcode::Lt as usize] = comparison::lt;
    table[Opcode::Le as usize] = comparison::le;
    table[Opcode::Gt as usize] = comparison::gt;
    table[Opcode::Ge as usize] = comparison::ge;
    table[Opcode::Eq as usize] = comparison::eq;
    table[Opcode::Ne as usize] = comparison::ne;

    // Array Operations (0x40-0x4F)
    table[Opcode::NewArray as usize] = array::new_array;
    table[Opcode::ArrayLoad as usize] = array::array_load;
    table[Opcode::ArrayStore as usize] = array::array_store;
    table[Opcode::ArrayLength as usize] = array::array_length;

    // Calls and Natives (0x50-0x5F)
    table[Opcode::Call as usize] = calls::call;
    table[Opcode::Report as usize] = calls::report;

    // Protected Regions (0x60-0x6F)
    table[Opcode::EnterRegion as usize] = region::enter_region;
    table[Opcode::LeaveProtected as usize] = region::leave_protected;
    table[Opcode::EndFinally as usize] = region::end_finally;

    table
}

/// Static dispatch table - computed at compile time.
pub static DISPATCH_TABLE: [OpHandler; 256] = build_dispatch_table();

/// Get the handler for an opcode.
#[inline(always)]
pub fn get_handler(opcode: u8) -> OpHandler {
    // Safety: opcode is u8, so always in bounds for 256-element array
    unsafe { *DISPATCH_TABLE.get_unchecked(opcode as usize) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_table_size() {
        assert_eq!(DISPATCH_TABLE.len(), 256);
    }

    #[test]
    fn test_unassigned_opcode_is_invalid() {
        let handler = get_handler(0xEE);
        assert_eq!(handler as usize, op_invalid as OpHandler as usize);
    }

    #[test]
    fn test_known_opcodes_are_assigned() {
        for opcode in [
            Opcode::Nop,
            Opcode::Add,
            Opcode::ArrayStore,
            Opcode::Call,
            Opcode::EnterRegion,
            Opcode::EndFinally,
        ] {
            let handler = get_handler(opcode as u8);
            assert_ne!(
                handler as usize,
                op_invalid as OpHandler as usize,
                "{opcode:?} unassigned"
            );
        }
    }

    #[test]
    fn test_control_flow_size() {
        // Keep the hot dispatch result small; Fatal carries the largest
        // payload via RuntimeError.
        let size = std::mem::size_of::<ControlFlow>();
        assert!(size <= 48, "ControlFlow size is {size} bytes");
    }
}
