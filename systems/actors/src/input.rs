//! Actor forwarding externally decoded moves, typically from a keyboard.

use std::{io, thread};

use bomberman_core::{Move, PlayerState};
use crossbeam_channel::{select, Receiver, Sender, TrySendError};

use crate::{mailbox, Actor, Mailbox, Outbox};

/// Actor whose moves come from an external input channel.
///
/// A move arriving while the previous one is still waiting to be consumed is
/// dropped, which keeps the player at one move per turn however fast keys
/// are pressed. The actor thread stops once a snapshot reports the player
/// dead or either peer goes away.
#[derive(Debug)]
pub struct InputActor {
    mailbox: Mailbox,
}

impl InputActor {
    /// Starts the actor thread reading moves from `input`.
    pub fn spawn(name: impl Into<String>, input: Receiver<Move>) -> io::Result<Self> {
        let name = name.into();
        let (mailbox, outbox) = mailbox(name.clone());
        let _ = thread::Builder::new()
            .name(format!("actor-{name}"))
            .spawn(move || forward(&name, &input, outbox))?;
        Ok(Self { mailbox })
    }
}

impl Actor for InputActor {
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

fn forward(name: &str, input: &Receiver<Move>, outbox: Outbox) {
    let Outbox { moves, updates } = outbox;
    let mut turn = 0;

    loop {
        select! {
            recv(input) -> intent => {
                let Ok(intent) = intent else {
                    log::debug!("[{name}] input closed");
                    return;
                };
                match moves.try_send(intent) {
                    Ok(()) => {}
                    Err(TrySendError::Full(dropped)) => {
                        log::trace!("[{name}] turn {turn}: move slot taken, dropping {dropped}");
                    }
                    Err(TrySendError::Disconnected(_)) => return,
                }
            }
            recv(updates) -> state => {
                let Ok(state) = state else {
                    log::debug!("[{name}] game closed");
                    return;
                };
                if !state.alive {
                    log::info!("[{name}] dead at turn {}, input actor stopping", state.turn);
                    return;
                }
                turn = state.turn;
            }
        }
    }
}
