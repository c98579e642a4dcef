//! Synchronous publish/subscribe topics
//!
//! Every producer in the station (source adapters, the fusion coordinator,
//! the playback scheduler and the consumer feed) owns a [`Topic`]. Handlers
//! run on the publishing thread, to completion, in subscription order.
//!
//! A panicking handler is caught and logged. It neither unwinds into the
//! producer nor prevents the remaining handlers from seeing the value.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Handle returned by [`Topic::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<T> = Box<dyn FnMut(&T)>;

/// Ordered list of handlers for values of type `T`
pub struct Topic<T> {
    name: &'static str,
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler<T>)>,
    failures: u64,
}

impl<T> Topic<T> {
    /// Create a topic; `name` only appears in log output
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: 0,
            handlers: Vec::new(),
            failures: 0,
        }
    }

    /// Register a handler, appended after all existing ones
    pub fn subscribe(&mut self, handler: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _)| *sub != id);
        before != self.handlers.len()
    }

    /// Deliver `value` to every handler and return how many completed normally
    pub fn publish(&mut self, value: &T) -> usize {
        let mut delivered = 0;
        for (id, handler) in self.handlers.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| handler(value))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    self.failures += 1;
                    tracing::error!(
                        "{} subscriber {:?} panicked: {}",
                        self.name,
                        id,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        delivered
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Number of handler invocations that panicked since creation
    pub fn failure_count(&self) -> u64 {
        self.failures
    }
}

impl<T> fmt::Debug for Topic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topic")
            .field("name", &self.name)
            .field("subscribers", &self.handlers.len())
            .field("failures", &self.failures)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut topic = Topic::new("test");
        for tag in ["a", "b", "c"] {
            let seen = seen.clone();
            topic.subscribe(move |v: &u32| seen.borrow_mut().push(format!("{tag}{v}")));
        }

        assert_eq!(topic.publish(&1), 3);
        assert_eq!(*seen.borrow(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut topic = Topic::new("test");
        let c = count.clone();
        let id = topic.subscribe(move |_: &u8| *c.borrow_mut() += 1);

        topic.publish(&0);
        assert!(topic.unsubscribe(id));
        assert!(!topic.unsubscribe(id));
        topic.publish(&0);

        assert_eq!(*count.borrow(), 1);
        assert!(topic.is_empty());
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut topic = Topic::new("test");
        topic.subscribe(|_: &i32| panic!("display crashed"));
        let s = seen.clone();
        topic.subscribe(move |v: &i32| s.borrow_mut().push(*v));

        assert_eq!(topic.publish(&5), 1);
        assert_eq!(topic.publish(&6), 1);
        assert_eq!(*seen.borrow(), vec![5, 6]);
        assert_eq!(topic.failure_count(), 2);
    }
}
