//! Unwinding over the active-region and frame stacks.
//!
//! Two routines drive all non-local control transfer:
//!
//! - [`VirtualMachine::resume_fault`] walks regions innermost-first and
//!   frames top-down until a handler catches the fault, parking it at
//!   every finally block on the way. A fault that escapes the entry
//!   frame becomes a fatal [`RuntimeError::UncaughtFault`].
//! - [`VirtualMachine::unwind_return`] leaves the current frame,
//!   detouring through any finally blocks of regions still active in
//!   that frame. Returns never cross frames; the caller resumes with
//!   the value on its stack.

use std::sync::Arc;

use crate::error::{RuntimeError, VmResult};
use crate::exception::state::{FaultSignal, PendingExit, RegionPhase};
use crate::vm::VirtualMachine;

use javelin_core::Value;

/// Where an unwind step sends control next.
enum Transfer {
    /// Jump to a handler at this pc, restoring this stack depth.
    Handler { pc: u32, base: u32 },
    /// Jump to a finally block, parking the in-flight exit.
    Finally { pc: u32, base: u32 },
    /// The region does not intercept; discard it and keep unwinding.
    Discard,
}

impl VirtualMachine {
    /// Propagate a fault until a handler accepts it.
    pub(crate) fn resume_fault(&mut self, sig: FaultSignal) -> VmResult<()> {
        loop {
            let Some(frame) = self.frames.last_mut() else {
                return Err(RuntimeError::uncaught_fault(sig.kind, sig.method, sig.pc));
            };
            let code = Arc::clone(&frame.code);

            while let Some(active) = frame.regions.last() {
                let entry = code
                    .regions
                    .get(active.region as usize)
                    .ok_or(RuntimeError::UnknownRegion {
                        index: active.region,
                    })?;

                let transfer = match active.phase {
                    RegionPhase::Try => match entry.handler_for(sig.kind.class()) {
                        Some(pc) => Transfer::Handler {
                            pc,
                            base: active.base_stack,
                        },
                        None => match entry.finally_pc {
                            Some(pc) => Transfer::Finally {
                                pc,
                                base: active.base_stack,
                            },
                            None => Transfer::Discard,
                        },
                    },
                    // A handler cannot catch a fault it raised itself,
                    // but the region's finally block still runs.
                    RegionPhase::Handler => match entry.finally_pc {
                        Some(pc) => Transfer::Finally {
                            pc,
                            base: active.base_stack,
                        },
                        None => Transfer::Discard,
                    },
                    // A fault inside a finally block replaces whatever
                    // exit was parked there.
                    RegionPhase::Finally => Transfer::Discard,
                };

                match transfer {
                    Transfer::Handler { pc, base } => {
                        if let Some(active) = frame.regions.last_mut() {
                            active.phase = RegionPhase::Handler;
                        }
                        frame.truncate_stack(base);
                        frame.ip = pc;
                        return Ok(());
                    }
                    Transfer::Finally { pc, base } => {
                        if let Some(active) = frame.regions.last_mut() {
                            active.phase = RegionPhase::Finally;
                            active.pending = PendingExit::Signal(sig);
                        }
                        frame.truncate_stack(base);
                        frame.ip = pc;
                        return Ok(());
                    }
                    Transfer::Discard => {
                        frame.regions.pop();
                    }
                }
            }

            // No region in this frame intercepts; unwind into the caller.
            self.frames.pop();
        }
    }

    /// Leave the current frame, running its remaining finally blocks.
    pub(crate) fn unwind_return(&mut self, value: Option<Value>) -> VmResult<()> {
        if let Some(frame) = self.frames.last_mut() {
            let code = Arc::clone(&frame.code);

            while let Some(active) = frame.regions.last() {
                let entry = code
                    .regions
                    .get(active.region as usize)
                    .ok_or(RuntimeError::UnknownRegion {
                        index: active.region,
                    })?;

                let transfer = match active.phase {
                    // A return inside a finally block cancels the
                    // parked exit and keeps unwinding.
                    RegionPhase::Finally => Transfer::Discard,
                    RegionPhase::Try | RegionPhase::Handler => match entry.finally_pc {
                        Some(pc) => Transfer::Finally {
                            pc,
                            base: active.base_stack,
                        },
                        None => Transfer::Discard,
                    },
                };

                match transfer {
                    Transfer::Finally { pc, base } => {
                        if let Some(active) = frame.regions.last_mut() {
                            active.phase = RegionPhase::Finally;
                            active.pending = PendingExit::Return(value);
                        }
                        frame.truncate_stack(base);
                        frame.ip = pc;
                        return Ok(());
                    }
                    _ => {
                        frame.regions.pop();
                    }
                }
            }
        }

        self.pop_frame(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use javelin_bytecode::{FunctionBuilder, HandlerKind, Opcode, ProgramBuilder};
    use javelin_core::{FaultClass, FaultKind};
    use std::sync::Arc as StdArc;

    fn guarded_program() -> StdArc<javelin_bytecode::Program> {
        let mut program = ProgramBuilder::new();
        let main = program.declare_method("main");

        let mut builder = FunctionBuilder::new("main");
        let region = builder.begin_region();
        builder.emit_op(Opcode::Nop);
        builder.end_protected();
        builder.bind_handler(region, HandlerKind::Exact(FaultClass::Arithmetic));
        builder.emit_op(Opcode::Nop);
        builder.end_protected();
        builder.end_region(region);
        builder.emit_return_void();
        program.define_method(main, builder.finish());
        program.set_entry(main);
        StdArc::new(program.finish())
    }

    #[test]
    fn test_fault_transfers_to_handler() {
        let program = guarded_program();
        let (mut vm, _reported) = VirtualMachine::collecting(StdArc::clone(&program));
        vm.push_entry_frame().unwrap();

        // Simulate having executed EnterRegion.
        let frame = vm.frames.last_mut().unwrap();
        frame
            .regions
            .push(crate::exception::ActiveRegion::enter(0, 0));

        vm.resume_fault(FaultSignal {
            kind: FaultKind::Arithmetic,
            method: StdArc::from("main"),
            pc: 1,
        })
        .unwrap();

        let frame = vm.frames.last().unwrap();
        assert_eq!(frame.regions.last().unwrap().phase, RegionPhase::Handler);
        assert_eq!(frame.ip, 3);
    }

    #[test]
    fn test_unmatched_fault_is_fatal() {
        let program = guarded_program();
        let (mut vm, _reported) = VirtualMachine::collecting(program);
        vm.push_entry_frame().unwrap();

        let err = vm
            .resume_fault(FaultSignal {
                kind: FaultKind::NegativeArraySize { size: -1 },
                method: StdArc::from("main"),
                pc: 0,
            })
            .unwrap_err();
        assert!(matches!(err, RuntimeError::UncaughtFault { .. }));
    }
}
