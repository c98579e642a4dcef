//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use groundlink_rs::CombinedRecord;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared list of records seen by a feed subscriber
pub type Seen = Rc<RefCell<Vec<CombinedRecord>>>;

/// A subscriber callback plus the list it appends to
pub fn recorder() -> (Seen, impl FnMut(&CombinedRecord) + 'static) {
    let seen: Seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |record: &CombinedRecord| sink.borrow_mut().push(record.clone()))
}

/// Timestamps of the records seen so far
pub fn timestamps(seen: &Seen) -> Vec<u64> {
    seen.borrow().iter().map(|r| r.timestamp).collect()
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
