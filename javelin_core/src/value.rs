//! Runtime value model.
//!
//! Every value the interpreter manipulates is either a 32-bit signed
//! integer or a reference to an integer array. Both are `Copy`:
//! duplicating an [`ArrayRef`] duplicates the reference, never the
//! backing storage, which is what gives arrays their identity semantics.

use std::fmt;

use crate::error::FaultKind;

/// Opaque handle to an array living in the VM's array heap.
///
/// Handles are plain indices; they are only meaningful to the heap that
/// issued them. Copying a handle aliases the same array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayRef(pub u32);

impl ArrayRef {
    /// The heap slot this handle names.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "array@{}", self.0)
    }
}

/// A single operand-stack or local-variable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// 32-bit signed integer with wraparound arithmetic.
    Int(i32),
    /// Reference to an `int[]` in the array heap.
    Array(ArrayRef),
}

impl Value {
    /// Returns the integer payload, if this is an `Int`.
    #[inline]
    pub const fn as_int(self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(i),
            Self::Array(_) => None,
        }
    }

    /// Returns the array handle, if this is an `Array`.
    #[inline]
    pub const fn as_array(self) -> Option<ArrayRef> {
        match self {
            Self::Int(_) => None,
            Self::Array(r) => Some(r),
        }
    }

    /// Name of the value's type, for diagnostics.
    #[inline]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Array(_) => "int[]",
        }
    }

    /// Truthiness used by conditional jumps: zero is false, everything
    /// else (including any array reference) is true.
    #[inline]
    pub const fn is_truthy(self) -> bool {
        match self {
            Self::Int(i) => i != 0,
            Self::Array(_) => true,
        }
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<ArrayRef> for Value {
    #[inline]
    fn from(r: ArrayRef) -> Self {
        Self::Array(r)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Array(r) => write!(f, "{r}"),
        }
    }
}

// ===== Integer arithmetic =====
//
// All binary arithmetic is two's-complement with silent wraparound.
// Division and remainder truncate toward zero and fault on a zero
// divisor; `i32::MIN / -1` wraps to `i32::MIN` rather than trapping.

/// Wrapping addition.
#[inline]
pub const fn add(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

/// Wrapping subtraction.
#[inline]
pub const fn sub(a: i32, b: i32) -> i32 {
    a.wrapping_sub(b)
}

/// Wrapping multiplication.
#[inline]
pub const fn mul(a: i32, b: i32) -> i32 {
    a.wrapping_mul(b)
}

/// Wrapping negation.
#[inline]
pub const fn neg(a: i32) -> i32 {
    a.wrapping_neg()
}

/// Truncating division. Faults on a zero divisor.
#[inline]
pub const fn div(a: i32, b: i32) -> Result<i32, FaultKind> {
    if b == 0 {
        Err(FaultKind::Arithmetic)
    } else {
        Ok(a.wrapping_div(b))
    }
}

/// Remainder with the sign of the dividend. Faults on a zero divisor.
#[inline]
pub const fn rem(a: i32, b: i32) -> Result<i32, FaultKind> {
    if b == 0 {
        Err(FaultKind::Arithmetic)
    } else {
        Ok(a.wrapping_rem(b))
    }
}
