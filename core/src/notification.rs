//! One-way channel carrying events from the simulation to its consumers.

use std::collections::VecDeque;

use thiserror::Error;

use crate::Event;

/// Consumer of the ordered event stream produced by each turn.
pub trait NotificationSink {
    /// Accepts the next event. Events arrive in generation order.
    fn publish(&mut self, event: Event) -> Result<(), NotificationError>;
}

/// Failures raised while publishing events.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// The queue reached its capacity before the consumer drained it.
    #[error("notification queue is full ({capacity} pending events)")]
    QueueFull {
        /// Maximum number of pending events.
        capacity: usize,
    },
}

/// FIFO queue of events waiting for the network layer.
#[derive(Clone, Debug, Default)]
pub struct NotificationQueue {
    pending: VecDeque<Event>,
    capacity: Option<usize>,
}

impl NotificationQueue {
    /// Creates an unbounded queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue that rejects events once `capacity` are pending.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    /// Number of events waiting to be consumed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Reports whether no event is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes and yields every pending event in publication order.
    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.pending.drain(..)
    }
}

impl NotificationSink for NotificationQueue {
    fn publish(&mut self, event: Event) -> Result<(), NotificationError> {
        if let Some(capacity) = self.capacity {
            if self.pending.len() >= capacity {
                return Err(NotificationError::QueueFull { capacity });
            }
        }
        self.pending.push_back(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_publication_order() {
        let mut queue = NotificationQueue::new();
        for turn in 1..=3 {
            queue
                .publish(Event::TurnStarted { turn })
                .expect("unbounded queue accepts events");
        }

        let drained: Vec<Event> = queue.drain().collect();
        assert_eq!(
            drained,
            vec![
                Event::TurnStarted { turn: 1 },
                Event::TurnStarted { turn: 2 },
                Event::TurnStarted { turn: 3 },
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn bounded_queue_rejects_overflow() {
        let mut queue = NotificationQueue::bounded(1);
        assert!(queue.publish(Event::TurnStarted { turn: 1 }).is_ok());
        assert_eq!(
            queue.publish(Event::TurnStarted { turn: 2 }),
            Err(NotificationError::QueueFull { capacity: 1 })
        );
        assert_eq!(queue.len(), 1);
    }
}
