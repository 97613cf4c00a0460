//! Synchronous entity events.
//!
//! Each observable entity owns an [`EventHub`]; subscribers get a channel
//! receiver. Emission happens synchronously on the thread mutating the
//! entity (the model thread), so an event is observable as soon as the
//! mutating call returns.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// An explicit subscriber list backed by unbounded channels.
///
/// Dropped receivers are pruned on the next emit.
#[derive(Debug)]
pub struct EventHub<T> {
    subscribers: Vec<Sender<T>>,
}

impl<T> Default for EventHub<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<T: Clone> EventHub<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver an event to every live subscriber.
    pub fn emit(&mut self, event: T) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers (stale ones are counted until pruned).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
