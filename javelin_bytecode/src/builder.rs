//! Builders for bytecode emission.
//!
//! The [`FunctionBuilder`] provides a high-level API for constructing one
//! method's bytecode with automatic label resolution, constant
//! deduplication, and protected-region assembly. The [`ProgramBuilder`]
//! collects finished methods, static fields, and the entry point into a
//! [`Program`].

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::code::{CodeObject, HandlerKind, LocalSlot, MethodId, Program, RegionEntry, StaticSlot};
use crate::instruction::{Instruction, Opcode};

/// A label for jump targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(u32);

/// A forward reference to a label that needs patching.
#[derive(Debug)]
struct ForwardRef {
    /// Instruction index containing the jump.
    instruction_index: usize,
    /// The label being jumped to.
    label: Label,
}

/// Identifies a protected region under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionToken(u16);

/// A region whose targets are still being bound.
#[derive(Debug)]
struct PendingRegion {
    handlers: SmallVec<[(HandlerKind, u32); 2]>,
    finally_pc: Option<u32>,
    exit_pc: Option<u32>,
}

/// Builder for constructing code objects.
///
/// This provides a high-level interface for:
/// - Emitting bytecode instructions
/// - Managing local variable slots
/// - Defining and resolving labels
/// - Assembling protected regions
///
/// # Example
/// ```ignore
/// let mut builder = FunctionBuilder::new("sub");
/// let a = builder.add_param("a");
/// let b = builder.add_param("b");
///
/// builder.emit_load_local(a);
/// builder.emit_load_local(b);
/// builder.emit_op(Opcode::Sub);
/// builder.emit_return();
///
/// let code = builder.finish();
/// ```
pub struct FunctionBuilder {
    /// Method name.
    name: Arc<str>,

    /// Emitted instructions.
    instructions: Vec<Instruction>,

    /// Constant pool.
    constants: Vec<i32>,
    /// Constant deduplication map.
    constant_map: FxHashMap<i32, u16>,

    /// Local variable names.
    locals: Vec<Arc<str>>,
    /// Local name to slot map.
    local_map: FxHashMap<Arc<str>, LocalSlot>,

    /// Number of parameters.
    arity: u8,
    /// Whether callers receive a value.
    returns_value: bool,

    /// Label counter.
    next_label: u32,
    /// Label to instruction index map.
    labels: FxHashMap<Label, usize>,
    /// Forward references that need patching.
    forward_refs: Vec<ForwardRef>,

    /// Protected regions, open and closed.
    regions: Vec<PendingRegion>,
}

impl FunctionBuilder {
    /// Create a new function builder.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
            constants: Vec::new(),
            constant_map: FxHashMap::default(),
            locals: Vec::new(),
            local_map: FxHashMap::default(),
            arity: 0,
            returns_value: false,
            next_label: 0,
            labels: FxHashMap::default(),
            forward_refs: Vec::new(),
            regions: Vec::new(),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Declare a parameter. Parameters occupy the first local slots in
    /// declaration order and are filled from the caller's stack.
    pub fn add_param(&mut self, name: impl Into<Arc<str>>) -> LocalSlot {
        let slot = self.define_local(name);
        debug_assert_eq!(slot.0 as usize, self.arity as usize, "params come first");
        self.arity += 1;
        slot
    }

    /// Mark the method as producing a return value.
    pub fn set_returns_value(&mut self, returns: bool) {
        self.returns_value = returns;
    }

    // =========================================================================
    // Local Variables
    // =========================================================================

    /// Define a local variable and return its slot.
    pub fn define_local(&mut self, name: impl Into<Arc<str>>) -> LocalSlot {
        let name = name.into();
        if let Some(&slot) = self.local_map.get(&name) {
            return slot;
        }
        let slot = LocalSlot::new(self.locals.len() as u16);
        self.local_map.insert(name.clone(), slot);
        self.locals.push(name);
        slot
    }

    /// Look up a local variable by name.
    pub fn lookup_local(&self, name: &str) -> Option<LocalSlot> {
        self.local_map.get(name).copied()
    }

    // =========================================================================
    // Constant Pool
    // =========================================================================

    /// Add a constant and return its index.
    pub fn add_constant(&mut self, value: i32) -> u16 {
        if let Some(&idx) = self.constant_map.get(&value) {
            return idx;
        }
        let idx = self.constants.len() as u16;
        self.constants.push(value);
        self.constant_map.insert(value, idx);
        idx
    }

    // =========================================================================
    // Labels
    // =========================================================================

    /// Create a new label for a jump target.
    pub fn create_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Mark the current position as the target for a label.
    pub fn bind_label(&mut self, label: Label) {
        let pc = self.instructions.len();
        self.labels.insert(label, pc);
    }

    /// Get the current instruction offset.
    pub fn current_pc(&self) -> u32 {
        self.instructions.len() as u32
    }

    // =========================================================================
    // Instruction Emission
    // =========================================================================

    /// Emit a raw instruction.
    #[inline]
    pub fn emit(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    /// Emit an operand-free instruction.
    #[inline]
    pub fn emit_op(&mut self, opcode: Opcode) {
        self.emit(Instruction::op(opcode));
    }

    // --- Stack and variables ---

    /// Push an integer literal, choosing the shortest encoding.
    pub fn emit_push(&mut self, value: i32) {
        if let Ok(small) = i16::try_from(value) {
            self.emit(Instruction::op_s(Opcode::PushSmall, small));
        } else {
            let idx = self.add_constant(value);
            self.emit(Instruction::op_i(Opcode::LoadConst, idx));
        }
    }

    /// Push a local variable.
    pub fn emit_load_local(&mut self, slot: LocalSlot) {
        self.emit(Instruction::op_i(Opcode::LoadLocal, slot.0));
    }

    /// Pop into a local variable.
    pub fn emit_store_local(&mut self, slot: LocalSlot) {
        self.emit(Instruction::op_i(Opcode::StoreLocal, slot.0));
    }

    /// Push a static field.
    pub fn emit_get_static(&mut self, slot: StaticSlot) {
        self.emit(Instruction::op_i(Opcode::GetStatic, slot.0));
    }

    /// Pop into a static field.
    pub fn emit_put_static(&mut self, slot: StaticSlot) {
        self.emit(Instruction::op_i(Opcode::PutStatic, slot.0));
    }

    // --- Control Flow ---

    /// Pop the return value and leave the frame.
    pub fn emit_return(&mut self) {
        self.emit_op(Opcode::Return);
    }

    /// Leave the frame with no return value.
    pub fn emit_return_void(&mut self) {
        self.emit_op(Opcode::ReturnVoid);
    }

    /// Unconditional jump to label.
    pub fn emit_jump(&mut self, label: Label) {
        self.emit_branch(Opcode::Jump, label);
    }

    /// Pop condition; jump to label if zero.
    pub fn emit_jump_if_false(&mut self, label: Label) {
        self.emit_branch(Opcode::JumpIfFalse, label);
    }

    /// Pop condition; jump to label if non-zero.
    pub fn emit_jump_if_true(&mut self, label: Label) {
        self.emit_branch(Opcode::JumpIfTrue, label);
    }

    fn emit_branch(&mut self, opcode: Opcode, label: Label) {
        let inst_idx = self.instructions.len();
        // Emit placeholder, will be patched later
        self.emit(Instruction::op(opcode));
        self.forward_refs.push(ForwardRef {
            instruction_index: inst_idx,
            label,
        });
    }

    // --- Calls ---

    /// Call a method; its arguments must already be on the stack.
    pub fn emit_call(&mut self, method: MethodId) {
        self.emit(Instruction::op_i(Opcode::Call, method.0));
    }

    /// Pop a value and hand it to the host report callback.
    pub fn emit_report(&mut self) {
        self.emit_op(Opcode::Report);
    }

    // =========================================================================
    // Protected Regions
    // =========================================================================

    /// Open a protected region and emit its `EnterRegion`.
    ///
    /// The instructions that follow, up to the matching
    /// [`end_protected`](Self::end_protected), are the protected body.
    pub fn begin_region(&mut self) -> RegionToken {
        let token = RegionToken(self.regions.len() as u16);
        self.regions.push(PendingRegion {
            handlers: SmallVec::new(),
            finally_pc: None,
            exit_pc: None,
        });
        self.emit(Instruction::op_i(Opcode::EnterRegion, token.0));
        token
    }

    /// Emit `LeaveProtected`, ending the protected body or a handler.
    pub fn end_protected(&mut self) {
        self.emit_op(Opcode::LeaveProtected);
    }

    /// Mark the current position as a handler for the region.
    ///
    /// Handler code must end with [`end_protected`](Self::end_protected).
    /// Handlers match in the order they are bound.
    pub fn bind_handler(&mut self, region: RegionToken, kind: HandlerKind) {
        let pc = self.current_pc();
        self.regions[region.0 as usize].handlers.push((kind, pc));
    }

    /// Mark the current position as the region's finally block.
    ///
    /// Finally code must end with an `EndFinally` instruction
    /// ([`emit_end_finally`](Self::emit_end_finally)).
    pub fn bind_finally(&mut self, region: RegionToken) {
        let pc = self.current_pc();
        self.regions[region.0 as usize].finally_pc = Some(pc);
    }

    /// Emit `EndFinally`, resuming the region's suspended exit.
    pub fn emit_end_finally(&mut self) {
        self.emit_op(Opcode::EndFinally);
    }

    /// Close the region, binding its exit to the current position.
    pub fn end_region(&mut self, region: RegionToken) {
        let pc = self.current_pc();
        self.regions[region.0 as usize].exit_pc = Some(pc);
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    /// Finish building and return the code object.
    ///
    /// # Panics
    ///
    /// Panics if a jump targets an unbound label, a branch spans more
    /// than an `i16` offset can reach, or a region was never closed;
    /// all are bugs in the emitting code.
    pub fn finish(mut self) -> CodeObject {
        // Patch forward references
        for fwd in self.forward_refs {
            let target = self.labels.get(&fwd.label).expect("unbound label");
            let offset = (*target as i32) - (fwd.instruction_index as i32) - 1;
            let offset = i16::try_from(offset).expect("branch offset overflow");

            let old = self.instructions[fwd.instruction_index];
            let opcode = Opcode::from_u8(old.opcode()).expect("placeholder has valid opcode");
            self.instructions[fwd.instruction_index] = Instruction::op_s(opcode, offset);
        }

        let regions = self
            .regions
            .into_iter()
            .map(|pending| RegionEntry {
                handlers: pending.handlers,
                finally_pc: pending.finally_pc,
                exit_pc: pending.exit_pc.expect("unclosed region"),
            })
            .collect();

        CodeObject {
            name: self.name,
            arity: self.arity,
            local_count: self.locals.len() as u16,
            returns_value: self.returns_value,
            instructions: self.instructions.into_boxed_slice(),
            constants: self.constants.into_boxed_slice(),
            regions,
        }
    }
}

// ===== Program assembly =====

/// Builder for a whole program.
///
/// Methods are declared up front so call sites can reference them before
/// their bodies exist, then defined in any order.
pub struct ProgramBuilder {
    methods: Vec<Option<Arc<CodeObject>>>,
    method_map: FxHashMap<Arc<str>, MethodId>,
    statics: Vec<i32>,
    static_map: FxHashMap<Arc<str>, StaticSlot>,
    entry: Option<MethodId>,
}

impl ProgramBuilder {
    /// Create an empty program builder.
    pub fn new() -> Self {
        Self {
            methods: Vec::new(),
            method_map: FxHashMap::default(),
            statics: Vec::new(),
            static_map: FxHashMap::default(),
            entry: None,
        }
    }

    /// Declare a method by name, returning its id for call sites.
    pub fn declare_method(&mut self, name: impl Into<Arc<str>>) -> MethodId {
        let name = name.into();
        if let Some(&id) = self.method_map.get(&name) {
            return id;
        }
        let id = MethodId(self.methods.len() as u16);
        self.method_map.insert(name, id);
        self.methods.push(None);
        id
    }

    /// Supply the body for a declared method.
    pub fn define_method(&mut self, id: MethodId, code: CodeObject) {
        self.methods[id.index()] = Some(Arc::new(code));
    }

    /// Add a static field with its initial value.
    pub fn add_static(&mut self, name: impl Into<Arc<str>>, initial: i32) -> StaticSlot {
        let name = name.into();
        if let Some(&slot) = self.static_map.get(&name) {
            return slot;
        }
        let slot = StaticSlot::new(self.statics.len() as u16);
        self.static_map.insert(name, slot);
        self.statics.push(initial);
        slot
    }

    /// Look up a static field by name.
    pub fn static_slot(&self, name: &str) -> Option<StaticSlot> {
        self.static_map.get(name).copied()
    }

    /// Select the entry method.
    pub fn set_entry(&mut self, id: MethodId) {
        self.entry = Some(id);
    }

    /// Finish building and return the program.
    ///
    /// # Panics
    ///
    /// Panics if a declared method was never defined or no entry point
    /// was selected.
    pub fn finish(self) -> Program {
        let methods = self
            .methods
            .into_iter()
            .map(|m| m.expect("declared method has no body"))
            .collect();
        Program::new(
            methods,
            self.statics.into_boxed_slice(),
            self.entry.expect("no entry method"),
        )
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use javelin_core::FaultClass;

    #[test]
    fn test_simple_function() {
        let mut builder = FunctionBuilder::new("sub");
        let a = builder.add_param("a");
        let b = builder.add_param("b");
        builder.set_returns_value(true);

        builder.emit_load_local(a);
        builder.emit_load_local(b);
        builder.emit_op(Opcode::Sub);
        builder.emit_return();

        let code = builder.finish();

        assert_eq!(&*code.name, "sub");
        assert_eq!(code.arity, 2);
        assert_eq!(code.local_count, 2);
        assert!(code.returns_value);
        assert_eq!(code.instructions.len(), 4);
    }

    #[test]
    fn test_constant_deduplication() {
        let mut builder = FunctionBuilder::new("consts");

        let idx1 = builder.add_constant(1_000_000);
        let idx2 = builder.add_constant(1_000_000);
        let idx3 = builder.add_constant(2_000_000);

        assert_eq!(idx1, idx2);
        assert_ne!(idx1, idx3);
    }

    #[test]
    fn test_push_chooses_encoding() {
        let mut builder = FunctionBuilder::new("push");
        builder.emit_push(100);
        builder.emit_push(-1);
        builder.emit_push(1_000_000);
        let code = builder.finish();

        assert_eq!(code.instructions[0].opcode(), Opcode::PushSmall as u8);
        assert_eq!(code.instructions[0].offset(), 100);
        assert_eq!(code.instructions[1].offset(), -1);
        assert_eq!(code.instructions[2].opcode(), Opcode::LoadConst as u8);
        assert_eq!(code.constants[code.instructions[2].imm16() as usize], 1_000_000);
    }

    #[test]
    fn test_backward_jump_patching() {
        let mut builder = FunctionBuilder::new("loop");

        let top = builder.create_label();
        builder.bind_label(top);
        builder.emit_op(Opcode::Nop);
        builder.emit_jump(top);
        builder.emit_return_void();

        let code = builder.finish();
        // Jump at index 1 targets index 0: offset = 0 - 1 - 1 = -2.
        assert_eq!(code.instructions[1].offset(), -2);
    }

    #[test]
    fn test_forward_jump_patching() {
        let mut builder = FunctionBuilder::new("skip");

        let done = builder.create_label();
        builder.emit_push(0);
        builder.emit_jump_if_false(done);
        builder.emit_op(Opcode::Nop);
        builder.bind_label(done);
        builder.emit_return_void();

        let code = builder.finish();
        // Branch at index 1 targets index 3: offset = 3 - 1 - 1 = 1.
        assert_eq!(code.instructions[1].offset(), 1);
    }

    #[test]
    #[should_panic(expected = "unbound label")]
    fn test_unbound_label_panics() {
        let mut builder = FunctionBuilder::new("bad");
        let label = builder.create_label();
        builder.emit_jump(label);
        let _ = builder.finish();
    }

    #[test]
    #[should_panic(expected = "branch offset overflow")]
    fn test_branch_past_i16_range_panics() {
        let mut builder = FunctionBuilder::new("huge");
        let far = builder.create_label();
        builder.emit_jump(far);
        for _ in 0..40_000 {
            builder.emit_op(Opcode::Nop);
        }
        builder.bind_label(far);
        builder.emit_return_void();
        let _ = builder.finish();
    }

    #[test]
    fn test_region_assembly() {
        let mut builder = FunctionBuilder::new("guarded");

        let region = builder.begin_region();
        builder.emit_push(1);
        builder.emit_op(Opcode::Pop);
        builder.end_protected();

        builder.bind_handler(region, HandlerKind::Exact(FaultClass::Arithmetic));
        builder.emit_op(Opcode::Nop);
        builder.end_protected();

        builder.bind_finally(region);
        builder.emit_end_finally();

        builder.end_region(region);
        builder.emit_return_void();

        let code = builder.finish();
        assert_eq!(code.regions.len(), 1);

        let entry = &code.regions[0];
        assert_eq!(entry.handlers.len(), 1);
        assert_eq!(entry.handler_for(FaultClass::Arithmetic), Some(4));
        assert_eq!(entry.finally_pc, Some(6));
        assert_eq!(entry.exit_pc, 7);
    }

    #[test]
    #[should_panic(expected = "unclosed region")]
    fn test_unclosed_region_panics() {
        let mut builder = FunctionBuilder::new("bad");
        let _region = builder.begin_region();
        builder.emit_return_void();
        let _ = builder.finish();
    }

    #[test]
    fn test_program_builder() {
        let mut program = ProgramBuilder::new();
        let main = program.declare_method("main");
        let helper = program.declare_method("helper");
        let field = program.add_static("counter", 5);

        let mut builder = FunctionBuilder::new("helper");
        builder.emit_return_void();
        program.define_method(helper, builder.finish());

        let mut builder = FunctionBuilder::new("main");
        builder.emit_get_static(field);
        builder.emit_op(Opcode::Pop);
        builder.emit_call(helper);
        builder.emit_return_void();
        program.define_method(main, builder.finish());

        program.set_entry(main);
        let program = program.finish();

        assert_eq!(program.methods.len(), 2);
        assert_eq!(program.statics.as_ref(), &[5]);
        assert_eq!(program.method_by_name("main"), Some(main));
        assert_eq!(program.entry, main);
    }

    #[test]
    #[should_panic(expected = "declared method has no body")]
    fn test_undefined_method_panics() {
        let mut program = ProgramBuilder::new();
        let main = program.declare_method("main");
        program.set_entry(main);
        let _ = program.finish();
    }
}
