#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Discrete-event turn scheduler.
//!
//! Actions are registered to fire a number of turns in the future and may
//! persist for several consecutive turns. The owner drives the clock with
//! [`Scheduler::advance`] and then executes whatever became due with
//! [`Scheduler::run_due`]. Actions that fire may chain further registrations
//! through the [`Registrar`] they are handed.

mod queue;

use std::mem;

pub use queue::{Event, EventQueue};

/// Unit of delayed work.
pub trait Action {
    /// Number of consecutive turns the action is invoked for.
    ///
    /// A duration of zero is treated as one.
    fn duration(&self) -> u32;
}

/// Anything that accepts new registrations relative to the current turn.
pub trait Register<A> {
    /// Schedules `action` to first fire `starts_in` turns from now.
    fn register(&mut self, action: A, starts_in: u64);
}

/// Turn-based scheduler owning the event queue and the turn counter.
#[derive(Debug)]
pub struct Scheduler<A> {
    events: EventQueue<A>,
    now: u64,
    due: Vec<Event<A>>,
}

impl<A: Action> Scheduler<A> {
    /// Creates a scheduler positioned at turn 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: EventQueue::new(),
            now: 0,
            due: Vec::new(),
        }
    }

    /// Current turn.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Schedules `action` to first fire `starts_in` turns from now.
    ///
    /// An offset of zero fires on the very next [`advance`](Self::advance).
    pub fn register(&mut self, action: A, starts_in: u64) {
        self.events
            .insert(Event::new(fire_turn(self.now, starts_in), action));
    }

    /// Schedules `action` to first fire at the absolute turn `fire_at`.
    ///
    /// Registrations in the past are accepted but silently dropped once the
    /// clock reaches them.
    pub fn register_at(&mut self, action: A, fire_at: u64) {
        self.events.insert(Event::new(fire_at, action));
    }

    /// Reports whether any event is still waiting to fire.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.events.is_empty()
    }

    /// Number of events waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    /// Actions due on the current turn that have not run yet.
    pub fn due(&self) -> impl Iterator<Item = &A> {
        self.due.iter().map(Event::action)
    }

    /// Advances the clock by one turn and collects the events due on it.
    ///
    /// Events whose turn was skipped over are discarded without firing.
    pub fn advance(&mut self) {
        self.now = self.now.saturating_add(1);
        self.due.clear();

        while self
            .events
            .peek_min()
            .is_some_and(|event| event.fire_at() <= self.now)
        {
            let Some(event) = self.events.extract_min() else {
                break;
            };
            if event.fire_at() < self.now {
                log::debug!(
                    "dropping event scheduled for turn {} at turn {}",
                    event.fire_at(),
                    self.now
                );
                continue;
            }
            self.due.push(event);
        }
    }

    /// Invokes every due action with the number of turns it already ran for.
    ///
    /// The first failing invocation stops the batch and its error is
    /// returned; nothing is retried. Actions that still have turns left after
    /// a successful invocation are re-queued for the next turn.
    pub fn run_due<F, E>(&mut self, mut invoke: F) -> Result<(), E>
    where
        F: FnMut(&A, u32, &mut Registrar<'_, A>) -> Result<(), E>,
    {
        let mut batch = mem::take(&mut self.due).into_iter();
        while let Some(mut event) = batch.next() {
            let mut registrar = Registrar {
                events: &mut self.events,
                now: self.now,
            };
            if let Err(error) = invoke(event.action(), event.turns_done(), &mut registrar) {
                self.due.extend(batch);
                return Err(error);
            }

            event.resume_at(self.now.saturating_add(1));
            if event.turns_done() < event.action().duration().max(1) {
                self.events.insert(event);
            }
        }
        Ok(())
    }
}

impl<A: Action> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> Register<A> for Scheduler<A> {
    fn register(&mut self, action: A, starts_in: u64) {
        Scheduler::register(self, action, starts_in);
    }
}

/// Registration handle passed to actions while they run.
#[derive(Debug)]
pub struct Registrar<'a, A> {
    events: &'a mut EventQueue<A>,
    now: u64,
}

impl<A> Registrar<'_, A> {
    /// Turn the invoking action is running on.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now
    }
}

impl<A> Register<A> for Registrar<'_, A> {
    fn register(&mut self, action: A, starts_in: u64) {
        self.events
            .insert(Event::new(fire_turn(self.now, starts_in), action));
    }
}

fn fire_turn(now: u64, starts_in: u64) -> u64 {
    now.saturating_add(starts_in.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Once(&'static str);

    impl Action for Once {
        fn duration(&self) -> u32 {
            1
        }
    }

    #[test]
    fn zero_offset_fires_on_next_advance() {
        let mut scheduler = Scheduler::new();
        scheduler.register(Once("now"), 0);

        scheduler.advance();
        assert_eq!(scheduler.due().copied().collect::<Vec<_>>(), vec![Once("now")]);
    }

    #[test]
    fn advance_clears_previous_due_set() {
        let mut scheduler = Scheduler::new();
        scheduler.register(Once("a"), 1);

        scheduler.advance();
        assert_eq!(scheduler.due().count(), 1);
        scheduler.advance();
        assert_eq!(scheduler.due().count(), 0);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn failing_action_stops_the_batch() {
        let mut scheduler = Scheduler::new();
        scheduler.register(Once("ok"), 1);
        scheduler.register(Once("boom"), 1);
        scheduler.register(Once("never"), 1);
        scheduler.advance();

        let mut seen = Vec::new();
        let result = scheduler.run_due(|action, _, _| {
            seen.push(action.0);
            if action.0 == "boom" {
                Err("exploded")
            } else {
                Ok(())
            }
        });

        assert_eq!(result, Err("exploded"));
        assert_eq!(seen, vec!["ok", "boom"]);
        assert_eq!(scheduler.due().copied().collect::<Vec<_>>(), vec![Once("never")]);
        assert!(!scheduler.has_pending(), "failed action must not be retried");
    }

    #[test]
    fn registrar_schedules_relative_to_running_turn() {
        let mut scheduler = Scheduler::new();
        scheduler.register(Once("parent"), 2);
        scheduler.advance();
        scheduler.advance();

        let result: Result<(), ()> = scheduler.run_due(|_, _, registrar| {
            assert_eq!(registrar.now(), 2);
            registrar.register(Once("child"), 3);
            Ok(())
        });
        assert!(result.is_ok());

        for _ in 0..2 {
            scheduler.advance();
            assert_eq!(scheduler.due().count(), 0);
        }
        scheduler.advance();
        assert_eq!(scheduler.now(), 5);
        assert_eq!(scheduler.due().copied().collect::<Vec<_>>(), vec![Once("child")]);
    }
}
