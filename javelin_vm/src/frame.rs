//! Call frame management.
//!
//! The Frame struct is the core execution context for one method
//! invocation: its code, instruction pointer, local slots, operand
//! stack, and the stack of protected regions it has entered.

use std::sync::Arc;

use smallvec::SmallVec;

use javelin_bytecode::{CodeObject, Instruction};
use javelin_core::{ArrayRef, Value};

use crate::error::{RuntimeError, VmResult};
use crate::exception::ActiveRegion;

/// Maximum frame stack depth before CallDepthExceeded.
pub const MAX_CALL_DEPTH: usize = 1000;

/// A call frame representing a method invocation.
///
/// Locals are allocated per frame and sized from the code object;
/// parameters occupy the first slots. The operand stack starts empty
/// and must be empty again when the frame exits, except for a return
/// value handed to the caller.
pub struct Frame {
    /// Code object being executed.
    pub code: Arc<CodeObject>,

    /// Instruction pointer (index into code.instructions).
    pub ip: u32,

    /// Local variable slots, parameters first.
    pub locals: Box<[Value]>,

    /// Operand stack.
    pub stack: Vec<Value>,

    /// Protected regions this frame has entered, innermost last.
    pub regions: SmallVec<[ActiveRegion; 2]>,
}

impl Frame {
    /// Create a new frame for executing a code object.
    ///
    /// Locals start as zero integers; the caller fills parameter slots.
    #[inline]
    pub fn new(code: Arc<CodeObject>) -> Self {
        let local_count = code.local_count as usize;
        Self {
            code,
            ip: 0,
            locals: vec![Value::Int(0); local_count].into_boxed_slice(),
            stack: Vec::with_capacity(8),
            regions: SmallVec::new(),
        }
    }

    // =========================================================================
    // Instruction Fetching
    // =========================================================================

    /// Fetch the current instruction and advance IP.
    ///
    /// Callers must check [`is_done`](Self::is_done) first.
    #[inline(always)]
    pub fn fetch(&mut self) -> Instruction {
        // Safety: the dispatch loop checks is_done() before fetching
        let inst = unsafe { *self.code.instructions.get_unchecked(self.ip as usize) };
        self.ip += 1;
        inst
    }

    /// Check if execution is complete (IP past end of instructions).
    #[inline(always)]
    pub fn is_done(&self) -> bool {
        self.ip as usize >= self.code.instructions.len()
    }

    // =========================================================================
    // Operand Stack
    // =========================================================================

    /// Push a value.
    #[inline(always)]
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop a value.
    #[inline(always)]
    pub fn pop(&mut self) -> VmResult<Value> {
        self.stack
            .pop()
            .ok_or_else(|| RuntimeError::stack_underflow(Arc::clone(&self.code.name)))
    }

    /// Pop a value that must be an integer.
    #[inline(always)]
    pub fn pop_int(&mut self) -> VmResult<i32> {
        let value = self.pop()?;
        value
            .as_int()
            .ok_or_else(|| RuntimeError::type_mismatch("int", value.type_name()))
    }

    /// Pop a value that must be an array reference.
    #[inline(always)]
    pub fn pop_array(&mut self) -> VmResult<ArrayRef> {
        let value = self.pop()?;
        value
            .as_array()
            .ok_or_else(|| RuntimeError::type_mismatch("int[]", value.type_name()))
    }

    /// Peek at the top of the stack.
    #[inline(always)]
    pub fn peek(&self) -> VmResult<Value> {
        self.stack
            .last()
            .copied()
            .ok_or_else(|| RuntimeError::stack_underflow(Arc::clone(&self.code.name)))
    }

    /// Drop everything above a recorded stack depth.
    ///
    /// Used when transferring control into a handler or finally block,
    /// which must start from the depth recorded at region entry.
    #[inline]
    pub fn truncate_stack(&mut self, depth: u32) {
        self.stack.truncate(depth as usize);
    }

    // =========================================================================
    // Locals and Constants
    // =========================================================================

    /// Read a local slot.
    #[inline(always)]
    pub fn get_local(&self, idx: u16) -> VmResult<Value> {
        self.locals
            .get(idx as usize)
            .copied()
            .ok_or(RuntimeError::UnknownLocal { index: idx })
    }

    /// Write a local slot.
    #[inline(always)]
    pub fn set_local(&mut self, idx: u16, value: Value) -> VmResult<()> {
        match self.locals.get_mut(idx as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::UnknownLocal { index: idx }),
        }
    }

    /// Read a constant from the pool.
    #[inline(always)]
    pub fn get_const(&self, idx: u16) -> VmResult<i32> {
        self.code
            .constants
            .get(idx as usize)
            .copied()
            .ok_or(RuntimeError::UnknownConstant { index: idx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use javelin_bytecode::{FunctionBuilder, Opcode};

    fn frame_for(code: CodeObject) -> Frame {
        Frame::new(Arc::new(code))
    }

    fn sample_code() -> CodeObject {
        let mut builder = FunctionBuilder::new("sample");
        builder.define_local("x");
        builder.define_local("y");
        builder.emit_push(1);
        builder.emit_push(70_000);
        builder.emit_op(Opcode::Add);
        builder.emit_return_void();
        builder.finish()
    }

    #[test]
    fn test_fetch_advances_ip() {
        let mut frame = frame_for(sample_code());
        assert!(!frame.is_done());

        let first = frame.fetch();
        assert_eq!(first.opcode(), Opcode::PushSmall as u8);
        assert_eq!(frame.ip, 1);

        frame.fetch();
        frame.fetch();
        frame.fetch();
        assert!(frame.is_done());
    }

    #[test]
    fn test_locals_start_zeroed() {
        let frame = frame_for(sample_code());
        assert_eq!(frame.locals.len(), 2);
        assert_eq!(frame.get_local(0).unwrap(), Value::Int(0));
        assert!(frame.get_local(9).is_err());
    }

    #[test]
    fn test_stack_discipline() {
        let mut frame = frame_for(sample_code());
        frame.push(Value::Int(3));
        frame.push(Value::Int(4));
        assert_eq!(frame.pop_int().unwrap(), 4);
        assert_eq!(frame.pop_int().unwrap(), 3);
        assert!(matches!(
            frame.pop(),
            Err(RuntimeError::StackUnderflow { .. })
        ));
    }

    #[test]
    fn test_pop_int_rejects_array() {
        let mut frame = frame_for(sample_code());
        frame.push(Value::Array(ArrayRef(0)));
        assert!(matches!(
            frame.pop_int(),
            Err(RuntimeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_truncate_stack() {
        let mut frame = frame_for(sample_code());
        frame.push(Value::Int(1));
        frame.push(Value::Int(2));
        frame.push(Value::Int(3));
        frame.truncate_stack(1);
        assert_eq!(frame.stack.len(), 1);
        assert_eq!(frame.peek().unwrap(), Value::Int(1));
    }
}
