//! Arena-backed storage for integer arrays.
//!
//! Arrays live for the whole run; handles are indices into the arena.
//! The heap only stores and hands out slices. Index bounds and
//! negative-size checks belong to the array opcodes, which turn them
//! into recoverable faults.

use javelin_core::ArrayRef;

/// The VM's array storage.
#[derive(Debug, Default)]
pub struct ArrayHeap {
    arrays: Vec<Box<[i32]>>,
}

impl ArrayHeap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self { arrays: Vec::new() }
    }

    /// Allocate a zero-filled array and return its handle.
    pub fn alloc(&mut self, len: usize) -> ArrayRef {
        let handle = ArrayRef(self.arrays.len() as u32);
        self.arrays.push(vec![0; len].into_boxed_slice());
        handle
    }

    /// The elements behind a handle.
    #[inline]
    pub fn get(&self, handle: ArrayRef) -> Option<&[i32]> {
        self.arrays.get(handle.index()).map(|a| &**a)
    }

    /// Mutable access to the elements behind a handle.
    #[inline]
    pub fn get_mut(&mut self, handle: ArrayRef) -> Option<&mut [i32]> {
        self.arrays.get_mut(handle.index()).map(|a| &mut **a)
    }

    /// Number of live arrays.
    #[inline]
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Whether nothing has been allocated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_zero_filled() {
        let mut heap = ArrayHeap::new();
        let r = heap.alloc(4);
        assert_eq!(heap.get(r).unwrap(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_handles_are_distinct() {
        let mut heap = ArrayHeap::new();
        let a = heap.alloc(1);
        let b = heap.alloc(1);
        assert_ne!(a, b);

        heap.get_mut(a).unwrap()[0] = 7;
        assert_eq!(heap.get(b).unwrap()[0], 0);
    }

    #[test]
    fn test_copied_handle_aliases() {
        let mut heap = ArrayHeap::new();
        let a = heap.alloc(2);
        let alias = a;
        heap.get_mut(alias).unwrap()[1] = 9;
        assert_eq!(heap.get(a).unwrap(), &[0, 9]);
    }

    #[test]
    fn test_unknown_handle() {
        let heap = ArrayHeap::new();
        assert!(heap.get(ArrayRef(3)).is_none());
    }

    #[test]
    fn test_zero_length_array() {
        let mut heap = ArrayHeap::new();
        let r = heap.alloc(0);
        assert_eq!(heap.get(r).unwrap().len(), 0);
    }
}
