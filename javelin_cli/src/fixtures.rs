//! Built-in demonstration programs.
//!
//! Two hand-assembled programs ship with the runner: a control-flow
//! exercise covering arithmetic, branches, loops, arrays, calls, and a
//! guarded division, and a long wrapping-arithmetic accumulation loop.

use javelin_bytecode::{
    FunctionBuilder, HandlerKind, Opcode, Program, ProgramBuilder,
};
use javelin_core::FaultClass;

/// Iteration count for [`fibonacci_program`] when none is given.
pub const DEFAULT_FIB_TIMES: i32 = 1_000_000_000;

/// The control-flow exercise.
///
/// Equivalent source, with `report` the native output call:
///
/// ```text
/// static int field = 1234567890;
///
/// static void main() {
///     int a = 1;
///     a = a + 2;
///     a = a * 3;                report(a);
///     a -= 7;                   report(a);
///     if (a > 2) a -= 1; else a += 1;
///                               report(a);
///     for (int i = 0; i < 7; i++) a++;
///                               report(a);
///     int[] ary = { a };        report(ary[0]);
///     a = sub(a, 3);            report(a);
///     try {
///         a /= 0;
///         report(1);
///     } catch (arithmetic fault) {
///         report(0);
///     } finally {
///         report(2);
///     }
///     int b = field / a;        report(b);
/// }
///
/// static int sub(int minuend, int subtrahend) {
///     return minuend - subtrahend;
/// }
/// ```
pub fn control_flow_program() -> Program {
    let mut program = ProgramBuilder::new();
    let main = program.declare_method("main");
    let sub = program.declare_method("sub");
    let field = program.add_static("field", 1_234_567_890);

    let mut builder = FunctionBuilder::new("sub");
    let minuend = builder.add_param("minuend");
    let subtrahend = builder.add_param("subtrahend");
    builder.set_returns_value(true);
    builder.emit_load_local(minuend);
    builder.emit_load_local(subtrahend);
    builder.emit_op(Opcode::Sub);
    builder.emit_return();
    program.define_method(sub, builder.finish());

    let mut builder = FunctionBuilder::new("main");
    let a = builder.define_local("a");
    let i = builder.define_local("i");
    let ary = builder.define_local("ary");
    let b = builder.define_local("b");

    builder.emit_push(1);
    builder.emit_store_local(a);
    builder.emit_load_local(a);
    builder.emit_push(2);
    builder.emit_op(Opcode::Add);
    builder.emit_store_local(a);
    builder.emit_load_local(a);
    builder.emit_push(3);
    builder.emit_op(Opcode::Mul);
    builder.emit_store_local(a);
    builder.emit_load_local(a);
    builder.emit_report();

    builder.emit_load_local(a);
    builder.emit_push(7);
    builder.emit_op(Opcode::Sub);
    builder.emit_store_local(a);
    builder.emit_load_local(a);
    builder.emit_report();

    let else_branch = builder.create_label();
    let end_if = builder.create_label();
    builder.emit_load_local(a);
    builder.emit_push(2);
    builder.emit_op(Opcode::Gt);
    builder.emit_jump_if_false(else_branch);
    builder.emit_load_local(a);
    builder.emit_push(1);
    builder.emit_op(Opcode::Sub);
    builder.emit_store_local(a);
    builder.emit_jump(end_if);
    builder.bind_label(else_branch);
    builder.emit_load_local(a);
    builder.emit_push(1);
    builder.emit_op(Opcode::Add);
    builder.emit_store_local(a);
    builder.bind_label(end_if);
    builder.emit_load_local(a);
    builder.emit_report();

    let loop_top = builder.create_label();
    let loop_done = builder.create_label();
    builder.emit_push(0);
    builder.emit_store_local(i);
    builder.bind_label(loop_top);
    builder.emit_load_local(i);
    builder.emit_push(7);
    builder.emit_op(Opcode::Lt);
    builder.emit_jump_if_false(loop_done);
    builder.emit_load_local(a);
    builder.emit_push(1);
    builder.emit_op(Opcode::Add);
    builder.emit_store_local(a);
    builder.emit_load_local(i);
    builder.emit_push(1);
    builder.emit_op(Opcode::Add);
    builder.emit_store_local(i);
    builder.emit_jump(loop_top);
    builder.bind_label(loop_done);
    builder.emit_load_local(a);
    builder.emit_report();

    builder.emit_push(1);
    builder.emit_op(Opcode::NewArray);
    builder.emit_store_local(ary);
    builder.emit_load_local(ary);
    builder.emit_push(0);
    builder.emit_load_local(a);
    builder.emit_op(Opcode::ArrayStore);
    builder.emit_load_local(ary);
    builder.emit_push(0);
    builder.emit_op(Opcode::ArrayLoad);
    builder.emit_report();

    builder.emit_load_local(a);
    builder.emit_push(3);
    builder.emit_call(sub);
    builder.emit_store_local(a);
    builder.emit_load_local(a);
    builder.emit_report();

    let region = builder.begin_region();
    builder.emit_load_local(a);
    builder.emit_push(0);
    builder.emit_op(Opcode::Div);
    builder.emit_store_local(a);
    builder.emit_push(1);
    builder.emit_report();
    builder.end_protected();
    builder.bind_handler(region, HandlerKind::Exact(FaultClass::Arithmetic));
    builder.emit_push(0);
    builder.emit_report();
    builder.end_protected();
    builder.bind_finally(region);
    builder.emit_push(2);
    builder.emit_report();
    builder.emit_end_finally();
    builder.end_region(region);

    builder.emit_get_static(field);
    builder.emit_load_local(a);
    builder.emit_op(Opcode::Div);
    builder.emit_store_local(b);
    builder.emit_load_local(b);
    builder.emit_report();
    builder.emit_return_void();

    program.define_method(main, builder.finish());
    program.set_entry(main);
    program.finish()
}

/// Fibonacci-style wrapping accumulation over `times` iterations.
///
/// ```text
/// static void main() {
///     int total = 1;
///     int prev = 1, pprev = 1;
///     for (int i = 2; i < times; i++) {
///         pprev = prev;
///         prev = total;
///         total = prev + pprev;
///     }
///     report(total);
/// }
/// ```
pub fn fibonacci_program(times: i32) -> Program {
    let mut program = ProgramBuilder::new();
    let main = program.declare_method("main");

    let mut builder = FunctionBuilder::new("main");
    let total = builder.define_local("total");
    let prev = builder.define_local("prev");
    let pprev = builder.define_local("pprev");
    let i = builder.define_local("i");

    builder.emit_push(1);
    builder.emit_store_local(total);
    builder.emit_push(1);
    builder.emit_store_local(prev);
    builder.emit_push(1);
    builder.emit_store_local(pprev);
    builder.emit_push(2);
    builder.emit_store_local(i);

    let top = builder.create_label();
    let done = builder.create_label();
    builder.bind_label(top);
    builder.emit_load_local(i);
    builder.emit_push(times);
    builder.emit_op(Opcode::Lt);
    builder.emit_jump_if_false(done);

    builder.emit_load_local(prev);
    builder.emit_store_local(pprev);
    builder.emit_load_local(total);
    builder.emit_store_local(prev);
    builder.emit_load_local(prev);
    builder.emit_load_local(pprev);
    builder.emit_op(Opcode::Add);
    builder.emit_store_local(total);

    builder.emit_load_local(i);
    builder.emit_push(1);
    builder.emit_op(Opcode::Add);
    builder.emit_store_local(i);
    builder.emit_jump(top);

    builder.bind_label(done);
    builder.emit_load_local(total);
    builder.emit_report();
    builder.emit_return_void();

    program.define_method(main, builder.finish());
    program.set_entry(main);
    program.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_control_flow_program_output() {
        let reported =
            javelin_vm::run_collecting(Arc::new(control_flow_program())).unwrap();
        assert_eq!(reported, vec![9, 2, 3, 10, 10, 7, 0, 2, 176_366_841]);
    }

    #[test]
    fn test_fibonacci_program_small_count() {
        let reported =
            javelin_vm::run_collecting(Arc::new(fibonacci_program(5))).unwrap();
        assert_eq!(reported, vec![5]);
    }
}
