//! Protected-region opcode handlers.
//!
//! `EnterRegion` activates a region entry, `LeaveProtected` ends its
//! body or a handler normally, and `EndFinally` resumes whatever exit
//! the finally block interrupted. The unwinding itself lives in
//! `exception::unwind`.

use std::sync::Arc;

use javelin_bytecode::Instruction;

use crate::dispatch::ControlFlow;
use crate::error::RuntimeError;
use crate::exception::{ActiveRegion, PendingExit, RegionPhase};
use crate::vm::VirtualMachine;

/// EnterRegion: activate region imm16 of the current method
#[inline(always)]
pub fn enter_region(vm: &mut VirtualMachine, inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let index = inst.imm16();
    if frame.code.regions.get(index as usize).is_none() {
        return ControlFlow::Fatal(RuntimeError::UnknownRegion { index });
    }
    let base = frame.stack.len() as u32;
    frame.regions.push(ActiveRegion::enter(index, base));
    ControlFlow::Continue
}

/// LeaveProtected: finish the protected body or a handler normally
///
/// Routes through the finally block if the region has one, otherwise
/// pops the region and jumps to its exit.
#[inline(always)]
pub fn leave_protected(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let code = Arc::clone(&frame.code);

    let Some(active) = frame.regions.last() else {
        return ControlFlow::Fatal(RuntimeError::NoActiveRegion);
    };
    let Some(entry) = code.regions.get(active.region as usize) else {
        return ControlFlow::Fatal(RuntimeError::UnknownRegion {
            index: active.region,
        });
    };
    let base = active.base_stack;
    let phase = active.phase;

    match entry.finally_pc {
        Some(finally_pc) if phase != RegionPhase::Finally => {
            if let Some(active) = frame.regions.last_mut() {
                active.phase = RegionPhase::Finally;
                active.pending = PendingExit::Complete;
            }
            frame.truncate_stack(base);
            frame.ip = finally_pc;
        }
        _ => {
            frame.regions.pop();
            frame.truncate_stack(base);
            frame.ip = entry.exit_pc;
        }
    }
    ControlFlow::Continue
}

/// EndFinally: pop the region and resume its parked exit
#[inline(always)]
pub fn end_finally(vm: &mut VirtualMachine, _inst: Instruction) -> ControlFlow {
    let frame = vm.frame_mut();
    let Some(active) = frame.regions.pop() else {
        return ControlFlow::Fatal(RuntimeError::NoActiveRegion);
    };
    let Some(entry) = frame.code.regions.get(active.region as usize) else {
        return ControlFlow::Fatal(RuntimeError::UnknownRegion {
            index: active.region,
        });
    };
    let exit_pc = entry.exit_pc;

    match active.pending {
        PendingExit::Complete => {
            vm.frame_mut().ip = exit_pc;
            ControlFlow::Continue
        }
        PendingExit::Signal(sig) => match vm.resume_fault(sig) {
            Ok(()) => ControlFlow::Continue,
            Err(err) => ControlFlow::Fatal(err),
        },
        PendingExit::Return(value) => match vm.unwind_return(value) {
            Ok(()) => ControlFlow::Continue,
            Err(err) => ControlFlow::Fatal(err),
        },
    }
}
