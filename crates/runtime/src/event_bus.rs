use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::frame::Frame;

/// An outbound event tagged with the frame that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<E> {
    pub frame_index: u64,
    pub payload: E,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

type Handler<E> = Box<dyn FnMut(&Event<E>)>;

/// Buffered event bus with explicit subscribe/unsubscribe.
///
/// `emit` only records. Handlers run in [`EventBus::dispatch`], which the owner
/// calls once its own state is consistent, so a handler never observes a
/// half-applied update. While nobody is subscribed, events are retained for
/// [`EventBus::drain`], bounded by `capacity` (oldest dropped first).
pub struct EventBus<E> {
    pending: VecDeque<Event<E>>,
    handlers: BTreeMap<SubscriptionId, Handler<E>>,
    next_id: u64,
    capacity: usize,
    dropped: u64,
}

impl<E> EventBus<E> {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            handlers: BTreeMap::new(),
            next_id: 0,
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn emit(&mut self, frame: Frame, payload: E) {
        if self.pending.len() == self.capacity {
            self.pending.pop_front();
            self.dropped += 1;
        }
        self.pending.push_back(Event {
            frame_index: frame.index,
            payload,
        });
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&Event<E>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.insert(id, Box::new(handler));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.handlers.remove(&id).is_some()
    }

    /// Delivers pending events to every handler in subscription order.
    ///
    /// Returns the number of events delivered. With no subscribers the events
    /// stay queued.
    pub fn dispatch(&mut self) -> usize {
        if self.handlers.is_empty() {
            return 0;
        }
        let mut delivered = 0;
        while let Some(event) = self.pending.pop_front() {
            for handler in self.handlers.values_mut() {
                handler(&event);
            }
            delivered += 1;
        }
        delivered
    }

    pub fn drain(&mut self) -> Vec<Event<E>> {
        self.pending.drain(..).collect()
    }

    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.pending.len())
            .field("subscribers", &self.handlers.len())
            .field("dropped", &self.dropped)
            .finish()
    }
}
