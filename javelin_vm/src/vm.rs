//! Virtual machine implementation.
//!
//! The VirtualMachine is the main execution engine for Javelin
//! bytecode. It owns the frame stack, the array heap, the mutable
//! static field image, and the host report bridge, and runs the
//! dispatch loop until the entry frame exits.

use std::sync::Arc;

use javelin_bytecode::{MethodId, Program};
use javelin_core::Value;

use crate::dispatch::{get_handler, ControlFlow};
use crate::error::{RuntimeError, VmResult};
use crate::exception::FaultSignal;
use crate::frame::{Frame, MAX_CALL_DEPTH};
use crate::heap::ArrayHeap;
use crate::native::{ReportFn, Reported};

/// The Javelin virtual machine.
///
/// Executes stack-based bytecode with:
/// - Frame stack for method calls (capped at [`MAX_CALL_DEPTH`])
/// - Arena-backed heap for integer arrays
/// - Program-level static fields, reset per VM
/// - A host-injected report callback
pub struct VirtualMachine {
    /// The program being executed.
    program: Arc<Program>,
    /// Frame stack, current frame last.
    pub frames: Vec<Frame>,
    /// Array storage.
    pub heap: ArrayHeap,
    /// Static field values, seeded from the program image.
    statics: Vec<i32>,
    /// Host report callback.
    report: ReportFn,
}

impl VirtualMachine {
    /// Create a new virtual machine with the given report callback.
    pub fn new(program: Arc<Program>, report: ReportFn) -> Self {
        let statics = program.statics.to_vec();
        Self {
            program,
            frames: Vec::with_capacity(16),
            heap: ArrayHeap::new(),
            statics,
            report,
        }
    }

    /// Create a virtual machine whose reports accumulate in a
    /// [`Reported`] sink, returned alongside it.
    pub fn collecting(program: Arc<Program>) -> (Self, Reported) {
        let reported = Reported::new();
        let vm = Self::new(program, reported.bridge());
        (vm, reported)
    }

    /// The program under execution.
    #[inline]
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Run the program's entry method to completion.
    pub fn execute(&mut self) -> VmResult<()> {
        self.push_entry_frame()?;
        self.run_loop()
    }

    /// Push a frame for the entry method.
    pub(crate) fn push_entry_frame(&mut self) -> VmResult<()> {
        let code = Arc::clone(self.program.entry_code());
        self.frames.push(Frame::new(code));
        Ok(())
    }

    /// Main dispatch loop.
    #[inline(never)] // Prevent inlining for better branch prediction
    fn run_loop(&mut self) -> VmResult<()> {
        loop {
            // Fetch, or detect frame completion.
            let inst = match self.frames.last_mut() {
                None => return Ok(()),
                Some(frame) if frame.is_done() => None,
                Some(frame) => Some(frame.fetch()),
            };
            let Some(inst) = inst else {
                // Implicit void return at the end of the code.
                self.unwind_return(None)?;
                continue;
            };

            let handler = get_handler(inst.opcode());
            match handler(self, inst) {
                ControlFlow::Continue => {}

                ControlFlow::Jump(offset) => {
                    // Offsets are relative to the next instruction and
                    // fetch() already advanced ip. A negative target is
                    // a malformed stream, not a wrap to pc 0.
                    if let Some(frame) = self.frames.last_mut() {
                        let target = frame.ip as i32 + offset as i32;
                        if target < 0 {
                            return Err(RuntimeError::BadJumpTarget { target });
                        }
                        frame.ip = target as u32;
                    }
                }

                ControlFlow::Call { method } => {
                    self.push_frame(MethodId(method))?;
                }

                ControlFlow::Return(value) => {
                    self.unwind_return(value)?;
                }

                ControlFlow::Fault(kind) => {
                    let (method, pc) = match self.frames.last() {
                        Some(frame) => {
                            (Arc::clone(&frame.code.name), frame.ip.saturating_sub(1))
                        }
                        None => (Arc::from("<no frame>"), 0),
                    };
                    self.resume_fault(FaultSignal { kind, method, pc })?;
                }

                ControlFlow::Fatal(err) => return Err(err),
            }
        }
    }

    // =========================================================================
    // Frame Management
    // =========================================================================

    /// Push a frame for a called method, moving its arguments from the
    /// caller's stack into the new frame's parameter slots.
    pub(crate) fn push_frame(&mut self, id: MethodId) -> VmResult<()> {
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(RuntimeError::call_depth_exceeded(self.frames.len()));
        }
        let code = self
            .program
            .method(id)
            .cloned()
            .ok_or_else(|| RuntimeError::unknown_method(id.0))?;

        let mut frame = Frame::new(code);
        let arity = frame.code.arity as usize;
        if arity > 0 {
            let caller = self
                .frames
                .last_mut()
                .ok_or_else(|| RuntimeError::stack_underflow(Arc::clone(&frame.code.name)))?;
            // Arguments were pushed left to right, so fill backwards.
            for slot in (0..arity).rev() {
                frame.locals[slot] = caller.pop()?;
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the current frame, handing any return value to the caller.
    pub(crate) fn pop_frame(&mut self, value: Option<Value>) {
        self.frames.pop();
        if let (Some(value), Some(caller)) = (value, self.frames.last_mut()) {
            caller.push(value);
        }
    }

    /// The currently executing frame.
    ///
    /// Only callable while the dispatch loop is running a handler, so a
    /// frame always exists.
    #[inline(always)]
    pub(crate) fn frame_mut(&mut self) -> &mut Frame {
        let idx = self.frames.len() - 1;
        &mut self.frames[idx]
    }

    // =========================================================================
    // Statics and Natives
    // =========================================================================

    /// Read a static field.
    #[inline]
    pub fn get_static(&self, index: u16) -> VmResult<i32> {
        self.statics
            .get(index as usize)
            .copied()
            .ok_or(RuntimeError::UnknownStatic { index })
    }

    /// Write a static field.
    #[inline]
    pub fn set_static(&mut self, index: u16, value: i32) -> VmResult<()> {
        match self.statics.get_mut(index as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::UnknownStatic { index }),
        }
    }

    /// Hand a value to the host report callback.
    #[inline]
    pub(crate) fn report_value(&mut self, value: i32) {
        (self.report)(value);
    }
}
