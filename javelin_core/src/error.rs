//! Recoverable fault taxonomy.
//!
//! Faults are the control-transfer values consumed by the protected-region
//! mechanism in the VM. They are distinct from the VM's fatal
//! `RuntimeError`: a fault can be caught by interpreted code, a fatal
//! error terminates the engine.

use std::fmt;
use thiserror::Error;

/// A recoverable fault raised by an executing instruction.
///
/// Carries enough payload to describe the fault to a human when it goes
/// uncaught; handler matching uses the payload-free [`FaultClass`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Integer division (or remainder) by zero.
    #[error("arithmetic fault: division by zero")]
    Arithmetic,

    /// Array index outside `0..length`.
    #[error("index fault: index {index} out of range for array of length {length}")]
    IndexOutOfBounds {
        /// The offending index as seen by the program.
        index: i32,
        /// Length of the accessed array.
        length: u32,
    },

    /// Array allocation with a negative length.
    #[error("negative array size: {size}")]
    NegativeArraySize {
        /// The requested length.
        size: i32,
    },
}

impl FaultKind {
    /// The payload-free class used for handler matching.
    #[inline]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::Arithmetic => FaultClass::Arithmetic,
            Self::IndexOutOfBounds { .. } => FaultClass::IndexOutOfBounds,
            Self::NegativeArraySize { .. } => FaultClass::NegativeArraySize,
        }
    }
}

/// Fault classification for handler matching.
///
/// A protected-region handler names the class it catches; the payload of
/// the concrete [`FaultKind`] never participates in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultClass {
    /// Division by zero.
    Arithmetic,
    /// Array index out of bounds.
    IndexOutOfBounds,
    /// Negative array allocation size.
    NegativeArraySize,
}

impl FaultClass {
    /// Human-readable class name.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Arithmetic => "Arithmetic",
            Self::IndexOutOfBounds => "IndexOutOfBounds",
            Self::NegativeArraySize => "NegativeArraySize",
        }
    }
}

impl fmt::Display for FaultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
