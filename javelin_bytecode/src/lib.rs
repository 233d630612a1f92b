//! Bytecode container for the Javelin interpreter.
//!
//! Defines the packed instruction word, the opcode set, finished
//! [`CodeObject`]s and [`Program`]s, and the builders that assemble them
//! with label patching and constant deduplication.

pub mod builder;
pub mod code;
pub mod instruction;

pub use builder::{FunctionBuilder, Label, ProgramBuilder, RegionToken};
pub use code::{
    CodeObject, HandlerKind, LocalSlot, MethodId, Program, RegionEntry, StaticSlot,
};
pub use instruction::{Instruction, InstructionFormat, Opcode};
