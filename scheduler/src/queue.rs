//! Min-priority queue of pending events keyed by the turn they fire at.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

/// Pending invocation of an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event<A> {
    fire_at: u64,
    turns_done: u32,
    action: A,
}

impl<A> Event<A> {
    /// Creates an event that has not been invoked yet.
    #[must_use]
    pub const fn new(fire_at: u64, action: A) -> Self {
        Self {
            fire_at,
            turns_done: 0,
            action,
        }
    }

    /// Turn at which the event next fires.
    #[must_use]
    pub const fn fire_at(&self) -> u64 {
        self.fire_at
    }

    /// Number of turns the action has already been invoked for.
    #[must_use]
    pub const fn turns_done(&self) -> u32 {
        self.turns_done
    }

    /// Action carried by the event.
    #[must_use]
    pub const fn action(&self) -> &A {
        &self.action
    }

    /// Records one completed invocation and moves the event to `next_turn`.
    pub(crate) fn resume_at(&mut self, next_turn: u64) {
        self.turns_done = self.turns_done.saturating_add(1);
        self.fire_at = next_turn;
    }
}

#[derive(Debug)]
struct Entry<A> {
    sequence: u64,
    event: Event<A>,
}

impl<A> Entry<A> {
    fn key(&self) -> (u64, u64) {
        (self.event.fire_at, self.sequence)
    }
}

impl<A> PartialEq for Entry<A> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<A> Eq for Entry<A> {}

impl<A> PartialOrd for Entry<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Entry<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Events ordered by `fire_at`, ties resolved in insertion order.
///
/// Every insertion receives a fresh sequence number, so an event re-queued
/// for a later turn lines up behind events that were already waiting for
/// that turn.
#[derive(Debug)]
pub struct EventQueue<A> {
    heap: BinaryHeap<Reverse<Entry<A>>>,
    next_sequence: u64,
}

impl<A> EventQueue<A> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    /// Inserts an event.
    pub fn insert(&mut self, event: Event<A>) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.heap.push(Reverse(Entry { sequence, event }));
    }

    /// Earliest pending event, if any.
    #[must_use]
    pub fn peek_min(&self) -> Option<&Event<A>> {
        self.heap.peek().map(|Reverse(entry)| &entry.event)
    }

    /// Removes and returns the earliest pending event.
    pub fn extract_min(&mut self) -> Option<Event<A>> {
        self.heap.pop().map(|Reverse(entry)| entry.event)
    }

    /// Reports whether no event is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

impl<A> Default for EventQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_fire_order() {
        let mut queue = EventQueue::new();
        for (fire_at, label) in [(5, "e"), (1, "a"), (3, "c"), (2, "b")] {
            queue.insert(Event::new(fire_at, label));
        }

        let drained: Vec<_> = std::iter::from_fn(|| queue.extract_min())
            .map(|event| *event.action())
            .collect();
        assert_eq!(drained, vec!["a", "b", "c", "e"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn equal_turns_keep_insertion_order() {
        let mut queue = EventQueue::new();
        queue.insert(Event::new(4, "first"));
        queue.insert(Event::new(4, "second"));
        queue.insert(Event::new(2, "early"));
        queue.insert(Event::new(4, "third"));

        assert_eq!(queue.peek_min().map(Event::fire_at), Some(2));
        let drained: Vec<_> = std::iter::from_fn(|| queue.extract_min())
            .map(|event| *event.action())
            .collect();
        assert_eq!(drained, vec!["early", "first", "second", "third"]);
    }

    #[test]
    fn empty_queue_yields_nothing() {
        let mut queue: EventQueue<()> = EventQueue::default();
        assert!(queue.peek_min().is_none());
        assert!(queue.extract_min().is_none());
        assert_eq!(queue.len(), 0);
    }
}
