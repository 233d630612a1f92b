//! Stack-based bytecode instruction definitions.
//!
//! This module defines the core instruction format for Javelin's
//! stack-based bytecode. All instructions are 32 bits wide for cache
//! efficiency and predictable decoding.
//!
//! # Instruction Format
//!
//! ```text
//! ┌─────────┬──────────┬───────────────────┐
//! │ opcode  │ reserved │       imm16       │
//! │ (8 bit) │ (8 bit)  │      (16 bit)     │
//! └─────────┴──────────┴───────────────────┘
//! ```
//!
//! - `opcode`: Operation to perform (256 max)
//! - `reserved`: Unused, always zero
//! - `imm16`: Immediate operand — a slot/pool index, a signed small
//!   integer, or a signed jump offset, depending on the opcode

use std::fmt;

/// A 32-bit bytecode instruction.
///
/// The instruction is stored as a packed 32-bit value for cache efficiency.
/// All fields are accessed through methods that extract the relevant bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Instruction(u32);

impl Instruction {
    /// Create an instruction from an opcode and a 16-bit immediate.
    #[inline]
    pub const fn new(opcode: Opcode, imm16: u16) -> Self {
        Instruction(((opcode as u32) << 24) | (imm16 as u32))
    }

    /// Create an instruction with only an opcode (no operand).
    #[inline]
    pub const fn op(opcode: Opcode) -> Self {
        Self::new(opcode, 0)
    }

    /// Create an instruction with an opcode and immediate operand.
    #[inline]
    pub const fn op_i(opcode: Opcode, imm16: u16) -> Self {
        Self::new(opcode, imm16)
    }

    /// Create an instruction with an opcode and a signed immediate.
    #[inline]
    pub const fn op_s(opcode: Opcode, imm: i16) -> Self {
        Self::new(opcode, imm as u16)
    }

    /// Get the opcode byte.
    #[inline]
    pub const fn opcode(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Get the 16-bit immediate.
    #[inline]
    pub const fn imm16(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Get the immediate reinterpreted as a signed offset or small int.
    #[inline]
    pub const fn offset(self) -> i16 {
        (self.0 & 0xFFFF) as u16 as i16
    }

    /// Get the raw 32-bit value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Create from raw 32-bit value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Instruction(raw)
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instruction({:02x}, {:#06x})", self.opcode(), self.imm16())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = Opcode::from_u8(self.opcode()) {
            write!(f, "{:?}", op)?;
            match op.format() {
                InstructionFormat::NoOperand => {}
                InstructionFormat::Imm16 => write!(f, " #{}", self.imm16())?,
                InstructionFormat::SignedImm16 => write!(f, " #{}", self.offset())?,
                InstructionFormat::Offset16 => write!(f, " {:+}", self.offset())?,
            }
            Ok(())
        } else {
            write!(f, "INVALID({:08x})", self.0)
        }
    }
}

/// Instruction format categories for disassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionFormat {
    /// No operand (e.g., Add, Pop).
    NoOperand,
    /// Unsigned 16-bit index (e.g., LoadLocal, Call).
    Imm16,
    /// Sign-extended 16-bit literal (PushSmall).
    SignedImm16,
    /// Signed 16-bit jump offset (Jump, JumpIfFalse).
    Offset16,
}

/// Bytecode opcodes for the stack-based VM.
///
/// Opcodes are organized by category:
/// - 0x00-0x0F: Control flow
/// - 0x10-0x1F: Stack and variable access
/// - 0x20-0x2F: Integer arithmetic
/// - 0x30-0x3F: Comparison
/// - 0x40-0x4F: Array operations
/// - 0x50-0x5F: Calls and natives
/// - 0x60-0x6F: Protected regions
/// - 0x70-0xFF: Reserved for future use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // =========================================================================
    // Control Flow (0x00-0x0F)
    // =========================================================================
    /// No operation.
    Nop = 0x00,
    /// Unconditional jump (signed 16-bit offset, relative to next instruction).
    Jump = 0x01,
    /// Pop condition; jump if zero.
    JumpIfFalse = 0x02,
    /// Pop condition; jump if non-zero.
    JumpIfTrue = 0x03,
    /// Pop return value and leave the current frame.
    Return = 0x04,
    /// Leave the current frame with no return value.
    ReturnVoid = 0x05,

    // =========================================================================
    // Stack and Variable Access (0x10-0x1F)
    // =========================================================================
    /// Push constant: push consts[imm16].
    LoadConst = 0x10,
    /// Push sign-extended 16-bit literal.
    PushSmall = 0x11,
    /// Push local: push locals[imm16].
    LoadLocal = 0x12,
    /// Pop into local: locals[imm16] = pop.
    StoreLocal = 0x13,
    /// Push static field: push statics[imm16].
    GetStatic = 0x14,
    /// Pop into static field: statics[imm16] = pop.
    PutStatic = 0x15,
    /// Duplicate the top of stack.
    Dup = 0x16,
    /// Discard the top of stack.
    Pop = 0x17,

    // =========================================================================
    // Integer Arithmetic (0x20-0x2F)
    // =========================================================================
    /// Wrapping add: push(pop + pop).
    Add = 0x20,
    /// Wrapping subtract: b = pop, a = pop, push(a - b).
    Sub = 0x21,
    /// Wrapping multiply: push(pop * pop).
    Mul = 0x22,
    /// Truncating divide: b = pop, a = pop, push(a / b). Faults on b == 0.
    Div = 0x23,
    /// Remainder: b = pop, a = pop, push(a % b). Faults on b == 0.
    Rem = 0x24,
    /// Wrapping negate: push(-pop).
    Neg = 0x25,

    // =========================================================================
    // Comparison (0x30-0x3F) — push 1 or 0
    // =========================================================================
    /// Less than: b = pop, a = pop, push(a < b).
    Lt = 0x30,
    /// Less than or equal.
    Le = 0x31,
    /// Greater than.
    Gt = 0x32,
    /// Greater than or equal.
    Ge = 0x33,
    /// Equal.
    Eq = 0x34,
    /// Not equal.
    Ne = 0x35,

    // =========================================================================
    // Array Operations (0x40-0x4F)
    // =========================================================================
    /// Allocate zero-filled array: len = pop, push(new int[len]).
    NewArray = 0x40,
    /// Load element: idx = pop, ref = pop, push(ref[idx]).
    ArrayLoad = 0x41,
    /// Store element: val = pop, idx = pop, ref = pop, ref[idx] = val.
    ArrayStore = 0x42,
    /// Length: ref = pop, push(ref.length).
    ArrayLength = 0x43,

    // =========================================================================
    // Calls and Natives (0x50-0x5F)
    // =========================================================================
    /// Call method imm16; pops the callee's arguments off this stack.
    Call = 0x50,
    /// Pop a value and hand it to the host report callback.
    Report = 0x51,

    // =========================================================================
    // Protected Regions (0x60-0x6F)
    // =========================================================================
    /// Activate region imm16 of the current method.
    EnterRegion = 0x60,
    /// Leave the innermost region's protected or handler code normally.
    LeaveProtected = 0x61,
    /// End a finally block and resume the region's suspended exit.
    EndFinally = 0x62,
}

impl Opcode {
    /// Convert from u8, returning None if invalid.
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Opcode::Nop),
            0x01 => Some(Opcode::Jump),
            0x02 => Some(Opcode::JumpIfFalse),
            0x03 => Some(Opcode::JumpIfTrue),
            0x04 => Some(Opcode::Return),
            0x05 => Some(Opcode::ReturnVoid),

            0x10 => Some(Opcode::LoadConst),
            0x11 => Some(Opcode::PushSmall),
            0x12 => Some(Opcode::LoadLocal),
            0x13 => Some(Opcode::StoreLocal),
            0x14 => Some(Opcode::GetStatic),
            0x15 => Some(Opcode::PutStatic),
            0x16 => Some(Opcode::Dup),
            0x17 => Some(Opcode::Pop),

            0x20 => Some(Opcode::Add),
            0x21 => Some(Opcode::Sub),
            0x22 => Some(Opcode::Mul),
            0x23 => Some(Opcode::Div),
            0x24 => Some(Opcode::Rem),
            0x25 => Some(Opcode::Neg),

            0x30 => Some(Opcode::Lt),
            0x31 => Some(Opcode::Le),
            0x32 => Some(Opcode::Gt),
            0x33 => Some(Opcode::Ge),
            0x34 => Some(Opcode::Eq),
            0x35 => Some(Opcode::Ne),

            0x40 => Some(Opcode::NewArray),
            0x41 => Some(Opcode::ArrayLoad),
            0x42 => Some(Opcode::ArrayStore),
            0x43 => Some(Opcode::ArrayLength),

            0x50 => Some(Opcode::Call),
            0x51 => Some(Opcode::Report),

            0x60 => Some(Opcode::EnterRegion),
            0x61 => Some(Opcode::LeaveProtected),
            0x62 => Some(Opcode::EndFinally),

            _ => None,
        }
    }

    /// Get the instruction format for this opcode.
    #[inline]
    pub const fn format(self) -> InstructionFormat {
        use InstructionFormat::*;
        use Opcode::*;

        match self {
            Nop | Return | ReturnVoid | Dup | Pop | Add | Sub | Mul | Div | Rem | Neg | Lt
            | Le | Gt | Ge | Eq | Ne | NewArray | ArrayLoad | ArrayStore | ArrayLength
            | Report | LeaveProtected | EndFinally => NoOperand,

            Jump | JumpIfFalse | JumpIfTrue => Offset16,

            PushSmall => SignedImm16,

            LoadConst | LoadLocal | StoreLocal | GetStatic | PutStatic | Call | EnterRegion => {
                Imm16
            }
        }
    }
}
