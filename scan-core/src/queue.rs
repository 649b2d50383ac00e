//! Queue abstraction shared between firmware and host targets.
//!
//! The UI only ever sees [`QueueProducer`]; firmware backs it with an
//! `embassy-sync` channel while tests use `heapless::Deque`.

use core::fmt;

/// Error surfaced when an item cannot be enqueued.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum QueueError {
    /// Queue has reached its maximum capacity.
    Full,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Full => f.write_str("queue full"),
        }
    }
}

/// Producer side of a bounded queue.
pub trait QueueProducer {
    /// Item carried by the queue.
    type Item;

    /// Attempts to enqueue an item without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] when no slot is free.
    fn try_enqueue(&mut self, item: Self::Item) -> Result<(), QueueError>;

    /// Returns the queue capacity if it is known.
    fn capacity(&self) -> Option<usize> {
        None
    }

    /// Returns the current queue depth if it can be observed.
    fn len(&self) -> Option<usize> {
        None
    }

    fn is_empty(&self) -> Option<bool> {
        self.len().map(|current| current == 0)
    }

    /// Remaining slots when both capacity and depth are observable.
    fn remaining(&self) -> Option<usize> {
        match (self.capacity(), self.len()) {
            (Some(capacity), Some(len)) => Some(capacity.saturating_sub(len)),
            _ => None,
        }
    }

    fn is_full(&self) -> Option<bool> {
        self.remaining().map(|slots| slots == 0)
    }
}

impl<T, const N: usize> QueueProducer for heapless::Deque<T, N> {
    type Item = T;

    fn try_enqueue(&mut self, item: T) -> Result<(), QueueError> {
        self.push_back(item).map_err(|_| QueueError::Full)
    }

    fn capacity(&self) -> Option<usize> {
        Some(N)
    }

    fn len(&self) -> Option<usize> {
        Some(<heapless::Deque<T, N>>::len(self))
    }
}
