//! FIFO event queue that stamps ids on entry.

use std::collections::VecDeque;

use crate::domain::{Event, EventId, IdGen};

/// An event plus its queue id and the id of the event whose handler produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEvent {
    pub id: EventId,
    /// `None` for events seeded by the engine itself.
    pub cause: Option<EventId>,
    pub event: Event,
}

#[derive(Debug, Default)]
pub struct EventQueue {
    inner: VecDeque<QueuedEvent>,
    ids: IdGen,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail and return the assigned id.
    pub fn push(&mut self, event: Event, cause: Option<EventId>) -> EventId {
        let id = self.ids.next_id();
        self.inner.push_back(QueuedEvent { id, cause, event });
        id
    }

    /// Non-blocking pop from the head.
    pub fn pop(&mut self) -> Option<QueuedEvent> {
        self.inner.pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Total events ever enqueued.
    pub fn enqueued(&self) -> u64 {
        self.ids.issued()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
