//! Opcode handlers, grouped by category.
//!
//! Every handler has the signature
//! `fn(&mut VirtualMachine, Instruction) -> ControlFlow` and is wired
//! into the dispatch table in `dispatch.rs`.

pub mod arithmetic;
pub mod array;
pub mod calls;
pub mod comparison;
pub mod control;
pub mod load_store;
pub mod region;

/// Unwrap a `VmResult` inside a handler, converting errors into
/// `ControlFlow::Fatal`.
macro_rules! vm_try {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => return $crate::dispatch::ControlFlow::Fatal(err),
        }
    };
}

pub(crate) use vm_try;
