//! Core types shared across the Javelin interpreter.
//!
//! This crate defines the value model (32-bit integers with wraparound
//! semantics, array references with identity) and the recoverable fault
//! taxonomy. It is dependency-light so that both the bytecode container
//! crate and the virtual machine can build on it.

pub mod error;
pub mod value;

pub use error::{FaultClass, FaultKind};
pub use value::{ArrayRef, Value};
