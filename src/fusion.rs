//! Fusion coordinator
//!
//! Merges the latest sample of each source into a [`CombinedRecord`] every
//! time either source delivers. There is no waiting for the other side and
//! no history: each slot is overwritten, and a partial record goes out as
//! soon as one side has data.

use crate::events::{SubscriptionId, Topic};
use crate::types::{AttitudeSample, CombinedRecord, PositionSample, Sample};

/// Holds one slot per source and republishes the fused view on every sample
#[derive(Debug)]
pub struct FusionCoordinator {
    attitude: Option<AttitudeSample>,
    position: Option<PositionSample>,
    listeners: Topic<CombinedRecord>,
    published: u64,
}

impl Default for FusionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl FusionCoordinator {
    pub fn new() -> Self {
        Self {
            attitude: None,
            position: None,
            listeners: Topic::new("fusion"),
            published: 0,
        }
    }

    /// Store `sample` in its slot, then fuse and publish
    ///
    /// Returns the record that was published.
    pub fn ingest(&mut self, sample: Sample) -> Option<CombinedRecord> {
        match sample {
            Sample::Attitude(s) => self.attitude = Some(s),
            Sample::Position(s) => self.position = Some(s),
        }
        let record = self.latest_combined()?;
        self.listeners.publish(&record);
        self.published += 1;
        Some(record)
    }

    /// Fused view of the currently held samples
    pub fn latest_combined(&self) -> Option<CombinedRecord> {
        CombinedRecord::fuse(self.attitude.clone(), self.position.clone())
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&CombinedRecord) + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Records published since creation
    pub fn published_count(&self) -> u64 {
        self.published
    }

    /// Drop both held samples
    pub fn clear(&mut self) {
        self.attitude = None;
        self.position = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Timestamp, Vector3};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn attitude(timestamp: Timestamp) -> Sample {
        AttitudeSample::with_euler(timestamp, Vector3::new(1.0, 2.0, 3.0)).into()
    }

    fn position(timestamp: Timestamp) -> Sample {
        PositionSample {
            timestamp,
            position: Vector3::new(10.0, 20.0, 30.0),
            orientation: Vector3::default(),
        }
        .into()
    }

    fn recording_fusion() -> (FusionCoordinator, Rc<RefCell<Vec<CombinedRecord>>>) {
        let mut fusion = FusionCoordinator::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        fusion.subscribe(move |r| s.borrow_mut().push(r.clone()));
        (fusion, seen)
    }

    #[test]
    fn test_attitude_then_position() {
        let (mut fusion, seen) = recording_fusion();
        fusion.ingest(attitude(1000));
        fusion.ingest(position(1200));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);

        assert_eq!(seen[0].timestamp, 1000);
        assert_eq!(
            seen[0].attitude.as_ref().map(|a| a.euler_angles),
            Some(Vector3::new(1.0, 2.0, 3.0))
        );
        assert!(seen[0].position.is_none());

        assert_eq!(seen[1].timestamp, 1200);
        assert!(seen[1].attitude.is_some());
        assert_eq!(
            seen[1].position.as_ref().map(|p| p.position),
            Some(Vector3::new(10.0, 20.0, 30.0))
        );
    }

    #[test]
    fn test_slots_are_overwritten() {
        let mut fusion = FusionCoordinator::new();
        fusion.ingest(position(10));
        fusion.ingest(position(20));
        let record = fusion.latest_combined().unwrap();
        assert_eq!(record.timestamp, 20);
        assert!(record.attitude.is_none());
    }

    #[test]
    fn test_nothing_held_nothing_fused() {
        let mut fusion = FusionCoordinator::new();
        assert!(fusion.latest_combined().is_none());
        fusion.ingest(attitude(1));
        fusion.clear();
        assert!(fusion.latest_combined().is_none());
    }

    #[test]
    fn test_listeners_called_in_registration_order() {
        let mut fusion = FusionCoordinator::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..3 {
            let o = order.clone();
            fusion.subscribe(move |_| o.borrow_mut().push(tag));
        }
        fusion.ingest(attitude(1));
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    fn arrival_sequence() -> impl Strategy<Value = Vec<(bool, u64)>> {
        prop::collection::vec((any::<bool>(), 0u64..500), 1..60)
    }

    proptest! {
        #[test]
        fn test_one_record_per_sample(steps in arrival_sequence()) {
            let (mut fusion, seen) = recording_fusion();
            let mut clocks = (0u64, 0u64);
            let mut held: (Option<u64>, Option<u64>) = (None, None);

            for (is_attitude, delta) in &steps {
                let sample = if *is_attitude {
                    clocks.0 += delta;
                    held.0 = Some(clocks.0);
                    attitude(clocks.0)
                } else {
                    clocks.1 += delta;
                    held.1 = Some(clocks.1);
                    position(clocks.1)
                };
                let record = fusion.ingest(sample);

                // Property: every published timestamp is the max of what is held
                let expected = held.0.into_iter().chain(held.1).max();
                prop_assert_eq!(record.map(|r| r.timestamp), expected);
            }

            // Property: exactly one record per sample, never empty
            let seen = seen.borrow();
            prop_assert_eq!(seen.len(), steps.len());
            for record in seen.iter() {
                prop_assert!(record.attitude.is_some() || record.position.is_some());
            }
            prop_assert_eq!(fusion.published_count(), steps.len() as u64);
        }
    }
}
