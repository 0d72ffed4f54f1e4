//! Deferred host callbacks
//!
//! Handlers are queued while the controller is borrowed and delivered once it
//! is released. Delivery runs on the caller's stack, before the triggering
//! method returns to the host.

use std::cell::RefCell;
use std::collections::VecDeque;

/// FIFO of pending deliveries
pub struct Outbox<T> {
    queue: RefCell<VecDeque<T>>,
}

impl<T> Default for Outbox<T> {
    fn default() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
        }
    }
}

impl<T> Outbox<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: T) {
        self.queue.borrow_mut().push_back(item);
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Deliver everything queued, in order, including items pushed by the
    /// deliveries themselves.
    ///
    /// A failed delivery does not stop the drain: the queue is always empty on
    /// return and the first failure is reported.
    pub fn drain<E>(&self, mut deliver: impl FnMut(T) -> Result<(), E>) -> Result<(), E> {
        let mut first_error = None;
        loop {
            // Released before delivering so a handler may queue more
            let next = self.queue.borrow_mut().pop_front();
            let Some(item) = next else { break };
            if let Err(e) = deliver(item) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_drain_delivers_in_order() {
        let outbox = Outbox::new();
        outbox.push("AdLoaded");
        outbox.push("AdStarted");

        let mut seen = Vec::new();
        outbox
            .drain(|event| {
                seen.push(event);
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(seen, vec!["AdLoaded", "AdStarted"]);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_failed_delivery_does_not_strand_later_events() {
        let outbox = Outbox::new();
        outbox.push("AdLoaded");
        outbox.push("AdStarted");

        let mut seen = Vec::new();
        let result = outbox.drain(|event| {
            seen.push(event);
            if event == "AdLoaded" {
                Err("handler threw")
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err("handler threw"));
        assert_eq!(seen, vec!["AdLoaded", "AdStarted"]);
        assert!(outbox.is_empty());

        // The next operation only sees its own events
        outbox.push("AdPaused");
        let mut next = Vec::new();
        outbox
            .drain(|event| {
                next.push(event);
                Ok::<(), &str>(())
            })
            .unwrap();
        assert_eq!(next, vec!["AdPaused"]);
    }

    #[test]
    fn test_first_error_wins() {
        let outbox = Outbox::new();
        for i in 0..3 {
            outbox.push(i);
        }
        assert_eq!(outbox.drain(Err), Err(0));
        assert_eq!(outbox.len(), 0);
    }

    #[test]
    fn test_deliveries_may_queue_more() {
        let outbox = Rc::new(Outbox::new());
        outbox.push(1);

        let inner = Rc::clone(&outbox);
        let mut seen = Vec::new();
        outbox
            .drain(|n| {
                seen.push(n);
                if n < 3 {
                    inner.push(n + 1);
                }
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(seen, vec![1, 2, 3]);
    }
}
