//! Fatal runtime error types for the virtual machine.
//!
//! These errors terminate execution; they are never visible to
//! interpreted code. Recoverable faults live in `javelin_core` and are
//! consumed by the protected-region machinery instead.

use std::fmt;
use std::sync::Arc;

use javelin_core::FaultKind;

/// Fatal error during bytecode execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// A fault propagated out of the entry frame without being caught.
    UncaughtFault {
        fault: FaultKind,
        method: Arc<str>,
        pc: u32,
    },
    /// Opcode byte with no registered handler.
    InvalidOpcode { opcode: u8 },
    /// A branch resolved to a negative instruction index.
    BadJumpTarget { target: i32 },
    /// An instruction popped from an empty operand stack.
    StackUnderflow { method: Arc<str> },
    /// An instruction found the wrong value type on the stack.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Call instruction referenced a method id outside the table.
    UnknownMethod { id: u16 },
    /// Constant pool index out of range.
    UnknownConstant { index: u16 },
    /// Local slot index out of range.
    UnknownLocal { index: u16 },
    /// Static field index out of range.
    UnknownStatic { index: u16 },
    /// Region table index out of range.
    UnknownRegion { index: u16 },
    /// `LeaveProtected` or `EndFinally` with no active region.
    NoActiveRegion,
    /// Array handle that the heap never issued.
    BadArrayRef { handle: u32 },
    /// Frame stack exceeded [`MAX_CALL_DEPTH`](crate::MAX_CALL_DEPTH).
    CallDepthExceeded { depth: usize },
}

impl RuntimeError {
    // =========================================================================
    // Convenience Constructors
    // =========================================================================

    #[inline]
    pub fn uncaught_fault(fault: FaultKind, method: Arc<str>, pc: u32) -> Self {
        Self::UncaughtFault { fault, method, pc }
    }

    #[inline]
    pub fn invalid_opcode(opcode: u8) -> Self {
        Self::InvalidOpcode { opcode }
    }

    #[inline]
    pub fn stack_underflow(method: Arc<str>) -> Self {
        Self::StackUnderflow { method }
    }

    #[inline]
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }

    #[inline]
    pub fn unknown_method(id: u16) -> Self {
        Self::UnknownMethod { id }
    }

    #[inline]
    pub fn bad_array_ref(handle: u32) -> Self {
        Self::BadArrayRef { handle }
    }

    #[inline]
    pub fn call_depth_exceeded(depth: usize) -> Self {
        Self::CallDepthExceeded { depth }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UncaughtFault { fault, method, pc } => {
                write!(f, "uncaught fault in {method} at pc {pc}: {fault}")
            }
            Self::InvalidOpcode { opcode } => {
                write!(f, "invalid opcode 0x{opcode:02x}")
            }
            Self::BadJumpTarget { target } => {
                write!(f, "jump target {target} out of range")
            }
            Self::StackUnderflow { method } => {
                write!(f, "operand stack underflow in {method}")
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Self::UnknownMethod { id } => write!(f, "unknown method id {id}"),
            Self::UnknownConstant { index } => write!(f, "constant index {index} out of range"),
            Self::UnknownLocal { index } => write!(f, "local slot {index} out of range"),
            Self::UnknownStatic { index } => write!(f, "static slot {index} out of range"),
            Self::UnknownRegion { index } => write!(f, "region index {index} out of range"),
            Self::NoActiveRegion => write!(f, "region instruction with no active region"),
            Self::BadArrayRef { handle } => write!(f, "invalid array handle {handle}"),
            Self::CallDepthExceeded { depth } => {
                write!(f, "maximum call depth exceeded ({depth})")
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for VM operations.
pub type VmResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncaught_fault_display() {
        let err = RuntimeError::uncaught_fault(FaultKind::Arithmetic, Arc::from("main"), 12);
        let text = err.to_string();
        assert!(text.contains("main"));
        assert!(text.contains("pc 12"));
        assert!(text.contains("division by zero"));
    }

    #[test]
    fn test_invalid_opcode_display() {
        let err = RuntimeError::invalid_opcode(0xEE);
        assert!(err.to_string().contains("0xee"));
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = RuntimeError::type_mismatch("int", "int[]");
        assert!(err.to_string().contains("expected int, found int[]"));
    }
}
