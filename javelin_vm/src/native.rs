//! Host callback bridge.
//!
//! The only native operation interpreted code can perform is `report`,
//! which hands one integer to the embedder. The callback is injected at
//! VM construction so hosts decide what reporting means: printing,
//! collecting, or anything else.

use std::cell::RefCell;
use std::rc::Rc;

/// The host-side report callback.
pub type ReportFn = Box<dyn FnMut(i32)>;

/// A report sink that collects values in order.
///
/// Cloning shares the underlying buffer, so a handle kept by the host
/// observes everything the VM's bridge records.
#[derive(Debug, Clone, Default)]
pub struct Reported {
    values: Rc<RefCell<Vec<i32>>>,
}

impl Reported {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that appends into this sink.
    pub fn bridge(&self) -> ReportFn {
        let values = Rc::clone(&self.values);
        Box::new(move |v| values.borrow_mut().push(v))
    }

    /// Snapshot of the values reported so far.
    pub fn values(&self) -> Vec<i32> {
        self.values.borrow().clone()
    }

    /// Drain the collected values.
    pub fn take(&self) -> Vec<i32> {
        std::mem::take(&mut *self.values.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_appends_in_order() {
        let reported = Reported::new();
        let mut bridge = reported.bridge();
        bridge(1);
        bridge(-2);
        bridge(3);
        assert_eq!(reported.values(), vec![1, -2, 3]);
    }

    #[test]
    fn test_take_drains() {
        let reported = Reported::new();
        let mut bridge = reported.bridge();
        bridge(5);
        assert_eq!(reported.take(), vec![5]);
        assert!(reported.values().is_empty());
    }

    #[test]
    fn test_clone_shares_buffer() {
        let reported = Reported::new();
        let other = reported.clone();
        reported.bridge()(42);
        assert_eq!(other.values(), vec![42]);
    }
}
