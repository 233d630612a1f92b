//! Finished code containers.
//!
//! A [`CodeObject`] is the immutable, fully-patched form of one method:
//! instruction stream, constant pool, and protected-region table. A
//! [`Program`] bundles every method with the static field image and the
//! entry point.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use javelin_core::FaultClass;

use crate::instruction::{Instruction, Opcode};

/// Identifies a method within a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MethodId(pub u16);

impl MethodId {
    /// Index into the program's method table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A local variable slot index within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct LocalSlot(pub u16);

impl LocalSlot {
    /// Create a new local slot.
    #[inline]
    pub const fn new(index: u16) -> Self {
        LocalSlot(index)
    }
}

/// A static field slot index within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct StaticSlot(pub u16);

impl StaticSlot {
    /// Create a new static slot.
    #[inline]
    pub const fn new(index: u16) -> Self {
        StaticSlot(index)
    }
}

/// What a protected-region handler catches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Catches exactly one fault class.
    Exact(FaultClass),
    /// Catches every fault.
    Any,
}

impl HandlerKind {
    /// Whether a fault of `class` is caught by this handler.
    #[inline]
    pub fn matches(self, class: FaultClass) -> bool {
        match self {
            Self::Exact(c) => c == class,
            Self::Any => true,
        }
    }
}

/// One protected region of a method.
///
/// Region membership is tracked dynamically: `EnterRegion` activates an
/// entry, so the table needs handler and finally targets but no pc
/// ranges. Handlers are tried in declaration order.
#[derive(Debug, Clone)]
pub struct RegionEntry {
    /// Handler targets, tried in order.
    pub handlers: SmallVec<[(HandlerKind, u32); 2]>,
    /// Start of the finally block, if the region has one.
    pub finally_pc: Option<u32>,
    /// Where execution continues after the region completes.
    pub exit_pc: u32,
}

impl RegionEntry {
    /// First handler target matching `class`, if any.
    #[inline]
    pub fn handler_for(&self, class: FaultClass) -> Option<u32> {
        self.handlers
            .iter()
            .find(|(kind, _)| kind.matches(class))
            .map(|&(_, pc)| pc)
    }
}

/// An immutable compiled method.
#[derive(Debug, Clone)]
pub struct CodeObject {
    /// Method name, for diagnostics and lookup.
    pub name: Arc<str>,
    /// Number of parameters, stored in locals `0..arity`.
    pub arity: u8,
    /// Total local slots, parameters included.
    pub local_count: u16,
    /// Whether callers should expect a value on their stack afterwards.
    pub returns_value: bool,
    /// The instruction stream.
    pub instructions: Box<[Instruction]>,
    /// Constant pool for values that do not fit a 16-bit immediate.
    pub constants: Box<[i32]>,
    /// Protected-region table, indexed by `EnterRegion`'s immediate.
    pub regions: Box<[RegionEntry]>,
}

impl CodeObject {
    /// Number of instructions.
    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the method has no instructions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl fmt::Display for CodeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "method {} (arity {}, locals {}):",
            self.name, self.arity, self.local_count
        )?;
        for (pc, inst) in self.instructions.iter().enumerate() {
            // Annotate jumps with their resolved target pc.
            let target = match Opcode::from_u8(inst.opcode()) {
                Some(Opcode::Jump | Opcode::JumpIfFalse | Opcode::JumpIfTrue) => {
                    Some((pc as i64 + 1 + inst.offset() as i64) as u32)
                }
                _ => None,
            };
            match target {
                Some(t) => writeln!(f, "  {pc:4}: {inst}  -> {t}")?,
                None => writeln!(f, "  {pc:4}: {inst}")?,
            }
        }
        for (i, region) in self.regions.iter().enumerate() {
            write!(f, "  region {i}: handlers=[")?;
            for (j, (kind, pc)) in region.handlers.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                match kind {
                    HandlerKind::Exact(class) => write!(f, "{class}@{pc}")?,
                    HandlerKind::Any => write!(f, "any@{pc}")?,
                }
            }
            write!(f, "]")?;
            if let Some(pc) = region.finally_pc {
                write!(f, " finally@{pc}")?;
            }
            writeln!(f, " exit@{}", region.exit_pc)?;
        }
        Ok(())
    }
}

/// A complete executable program.
#[derive(Debug)]
pub struct Program {
    /// Method table; [`MethodId`]s index into it.
    pub methods: Box<[Arc<CodeObject>]>,
    /// Initial values of the static fields.
    pub statics: Box<[i32]>,
    /// Method executed by `VirtualMachine::execute`.
    pub entry: MethodId,
    method_names: FxHashMap<Arc<str>, MethodId>,
}

impl Program {
    /// Assemble a program from its parts.
    pub fn new(methods: Box<[Arc<CodeObject>]>, statics: Box<[i32]>, entry: MethodId) -> Self {
        let method_names = methods
            .iter()
            .enumerate()
            .map(|(i, code)| (Arc::clone(&code.name), MethodId(i as u16)))
            .collect();
        Program {
            methods,
            statics,
            entry,
            method_names,
        }
    }

    /// Look up a method by id.
    #[inline]
    pub fn method(&self, id: MethodId) -> Option<&Arc<CodeObject>> {
        self.methods.get(id.index())
    }

    /// Look up a method id by name.
    #[inline]
    pub fn method_by_name(&self, name: &str) -> Option<MethodId> {
        self.method_names.get(name).copied()
    }

    /// The entry method's code.
    #[inline]
    pub fn entry_code(&self) -> &Arc<CodeObject> {
        &self.methods[self.entry.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> Arc<CodeObject> {
        Arc::new(CodeObject {
            name: Arc::from(name),
            arity: 0,
            local_count: 0,
            returns_value: false,
            instructions: vec![Instruction::op(Opcode::ReturnVoid)].into_boxed_slice(),
            constants: Box::new([]),
            regions: Box::new([]),
        })
    }

    #[test]
    fn test_handler_matching_order() {
        let region = RegionEntry {
            handlers: SmallVec::from_vec(vec![
                (HandlerKind::Exact(FaultClass::Arithmetic), 10),
                (HandlerKind::Any, 20),
            ]),
            finally_pc: None,
            exit_pc: 30,
        };
        assert_eq!(region.handler_for(FaultClass::Arithmetic), Some(10));
        assert_eq!(region.handler_for(FaultClass::IndexOutOfBounds), Some(20));
    }

    #[test]
    fn test_no_matching_handler() {
        let region = RegionEntry {
            handlers: SmallVec::from_vec(vec![(
                HandlerKind::Exact(FaultClass::Arithmetic),
                5,
            )]),
            finally_pc: Some(8),
            exit_pc: 12,
        };
        assert_eq!(region.handler_for(FaultClass::IndexOutOfBounds), None);
    }

    #[test]
    fn test_program_name_lookup() {
        let program = Program::new(
            vec![leaf("main"), leaf("sub")].into_boxed_slice(),
            Box::new([]),
            MethodId(0),
        );
        assert_eq!(program.method_by_name("sub"), Some(MethodId(1)));
        assert_eq!(program.method_by_name("missing"), None);
        assert_eq!(program.entry_code().name.as_ref(), "main");
    }

    #[test]
    fn test_display_annotates_jump_targets() {
        let code = CodeObject {
            name: Arc::from("loop"),
            arity: 0,
            local_count: 1,
            returns_value: false,
            instructions: vec![
                Instruction::op_s(Opcode::PushSmall, 1),
                Instruction::op_s(Opcode::Jump, -2),
            ]
            .into_boxed_slice(),
            constants: Box::new([]),
            regions: Box::new([]),
        };
        let text = code.to_string();
        assert!(text.contains("Jump"));
        assert!(text.contains("-> 0"));
    }
}
