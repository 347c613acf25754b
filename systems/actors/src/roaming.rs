//! Self-paced AI actors that pick their moves at random.

use std::{
    io, thread,
    time::{Duration, Instant},
};

use bomberman_core::{Move, PlayerState};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{mailbox, Actor, Mailbox, Outbox};

/// Outcome of one random draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Choice {
    Propose(Move),
    /// Stay idle for this many turn durations.
    Idle(u32),
}

fn choose(rng: &mut impl Rng, bombs: bool) -> Choice {
    match rng.gen_range(0..10_u32) {
        0 => Choice::Propose(Move::Up),
        1 => Choice::Propose(Move::Down),
        2 => Choice::Propose(Move::Left),
        3 => Choice::Propose(Move::Right),
        4 if bombs => Choice::Propose(Move::PlaceBomb),
        idle => Choice::Idle(idle),
    }
}

/// Actor choosing uniformly between moving, placing a bomb and idling.
///
/// It does not track the turn loop; a proposal blocks until the previous one
/// was consumed, and idling is what paces it.
#[derive(Debug)]
pub struct RandomActor {
    mailbox: Mailbox,
}

impl RandomActor {
    /// Starts the actor thread with a deterministic random stream.
    pub fn spawn(name: impl Into<String>, turn_duration: Duration, seed: u64) -> io::Result<Self> {
        let mailbox = spawn_roamer(name.into(), turn_duration, seed, true)?;
        Ok(Self { mailbox })
    }
}

impl Actor for RandomActor {
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

/// Same as [`RandomActor`] without ever placing a bomb.
#[derive(Debug)]
pub struct WanderingActor {
    mailbox: Mailbox,
}

impl WanderingActor {
    /// Starts the actor thread with a deterministic random stream.
    pub fn spawn(name: impl Into<String>, turn_duration: Duration, seed: u64) -> io::Result<Self> {
        let mailbox = spawn_roamer(name.into(), turn_duration, seed, false)?;
        Ok(Self { mailbox })
    }
}

impl Actor for WanderingActor {
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

fn spawn_roamer(name: String, turn_duration: Duration, seed: u64, bombs: bool) -> io::Result<Mailbox> {
    let (mailbox, outbox) = mailbox(name.clone());
    let _ = thread::Builder::new()
        .name(format!("actor-{name}"))
        .spawn(move || {
            let rng = ChaCha8Rng::seed_from_u64(seed);
            roam(&name, turn_duration, rng, bombs, outbox);
        })?;
    Ok(mailbox)
}

fn roam(name: &str, turn_duration: Duration, mut rng: ChaCha8Rng, bombs: bool, outbox: Outbox) {
    let Outbox { moves, updates } = outbox;

    loop {
        match choose(&mut rng, bombs) {
            Choice::Propose(intent) => {
                if moves.send(intent).is_err() {
                    log::debug!("[{name}] game closed");
                    return;
                }
            }
            Choice::Idle(turns) => {
                let Some(deadline) = idle_deadline(Instant::now(), turn_duration, turns) else {
                    log::warn!("[{name}] idling {turns} turns of {turn_duration:?} overflows, stopping");
                    return;
                };
                if !idle_until(name, &updates, deadline) {
                    return;
                }
            }
        }
    }
}

/// End of an idle period of `turns` turn durations, if representable.
fn idle_deadline(now: Instant, turn_duration: Duration, turns: u32) -> Option<Instant> {
    turn_duration
        .checked_mul(turns)
        .and_then(|wait| now.checked_add(wait))
}

/// Waits for `deadline` while accepting snapshots. Returns `false` once the
/// actor should stop.
fn idle_until(name: &str, updates: &Receiver<PlayerState>, deadline: Instant) -> bool {
    loop {
        match updates.recv_deadline(deadline) {
            Ok(state) if !state.alive => {
                log::info!("[{name}] dead at turn {}, stopping", state.turn);
                return false;
            }
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => return true,
            Err(RecvTimeoutError::Disconnected) => {
                log::debug!("[{name}] game closed");
                return false;
            }
        }
    }
}
