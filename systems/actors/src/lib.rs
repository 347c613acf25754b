#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Concurrent move producers that drive the players of a game.
//!
//! Every actor exposes the same narrow contract: a single-slot channel the
//! turn loop polls for the next move, and a rendezvous channel the turn loop
//! offers a fresh [`PlayerState`] snapshot on once per tick. The turn loop
//! only ever uses the non-blocking halves of both channels, so an actor that
//! is slow, asleep or gone never stalls the simulation.

mod input;
mod roaming;

use bomberman_core::{Move, PlayerState};
use crossbeam_channel::{Receiver, Sender};

pub use input::InputActor;
pub use roaming::{RandomActor, WanderingActor};

/// Capacity of the outbound move slot. One move per actor per turn.
pub const MOVE_SLOT: usize = 1;

/// Capacity of the inbound snapshot channel. Snapshots are handed over, never buffered.
pub const SNAPSHOT_SLOT: usize = 0;

/// Capability shared by every move-producing participant.
pub trait Actor: Send {
    /// Display name of the actor.
    fn name(&self) -> &str;

    /// Moves proposed by the actor, at most one waiting at a time.
    fn pending_move(&self) -> &Receiver<Move>;

    /// Delivery channel for the per-tick snapshot.
    fn inbox(&self) -> &Sender<PlayerState>;
}

/// Channel ends an actor hands to the turn loop.
#[derive(Debug)]
struct Mailbox {
    name: String,
    moves: Receiver<Move>,
    inbox: Sender<PlayerState>,
}

/// Actor ends kept by the actor's own loop.
#[derive(Debug)]
struct Outbox {
    moves: Sender<Move>,
    updates: Receiver<PlayerState>,
}

fn mailbox(name: String) -> (Mailbox, Outbox) {
    let (moves_tx, moves_rx) = crossbeam_channel::bounded(MOVE_SLOT);
    let (inbox_tx, inbox_rx) = crossbeam_channel::bounded(SNAPSHOT_SLOT);
    (
        Mailbox {
            name,
            moves: moves_rx,
            inbox: inbox_tx,
        },
        Outbox {
            moves: moves_tx,
            updates: inbox_rx,
        },
    )
}

impl Actor for Mailbox {
    fn name(&self) -> &str {
        &self.name
    }

    fn pending_move(&self) -> &Receiver<Move> {
        &self.moves
    }

    fn inbox(&self) -> &Sender<PlayerState> {
        &self.inbox
    }
}

/// Stationary opponent that never proposes a move.
///
/// Both of its channel peers are dropped on construction, so polling it
/// always reports a disconnected channel.
#[derive(Debug)]
pub struct ImmobileActor {
    mailbox: Mailbox,
}

impl ImmobileActor {
    /// Creates the actor. No thread is started.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let (mailbox, _) = mailbox(name.into());
        Self { mailbox }
    }
}

impl Actor for ImmobileActor {
    fn name(&self) -> &str {
        self.mailbox.name()
    }

    fn pending_move(&self) -> &Receiver<Move> {
        self.mailbox.pending_move()
    }

    fn inbox(&self) -> &Sender<PlayerState> {
        self.mailbox.inbox()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::{sync::Arc, time::Duration};

    use bomberman_core::{BoardView, CellCoord, PlayerState};

    pub(crate) fn snapshot(name: &str, alive: bool) -> PlayerState {
        PlayerState {
            turn: 1,
            turn_duration: Duration::from_millis(1),
            name: name.to_owned(),
            position: CellCoord::new(1, 1),
            last_position: CellCoord::new(1, 1),
            bombs: 0,
            max_bombs: 1,
            max_radius: 1,
            alive,
            board: Arc::new(BoardView::default()),
        }
    }
}
