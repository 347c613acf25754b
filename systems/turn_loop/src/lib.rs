#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-period turn loop tying actors, the scheduler and the world together.
//!
//! Every tick runs the same fixed sequence: at most one UI event, at most one
//! scheduler turn, at most one move per living actor, a render, a snapshot
//! broadcast and finally the end-of-game check. The loop is the only writer
//! of the world and never waits on an actor.

mod ui;

use std::{fmt, io, sync::Arc};

use bomberman_core::{GameConfig, Move, PlayerId};
use bomberman_scheduler::Scheduler;
use bomberman_system_actors::{Actor, ImmobileActor, InputActor, RandomActor, WanderingActor};
use bomberman_world::{
    bombs::{self, BombAction},
    generation, World, WorldError,
};
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

pub use ui::{decode_move, is_quit, Frame, Key, Renderer, UiEvent};

/// Names of the players of a standard match, in spawn order.
pub const STANDARD_PLAYERS: [&str; 4] = ["p1", "p2", "p3", "p4"];

/// Failures that end the turn loop.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The world detected a broken invariant.
    #[error(transparent)]
    World(#[from] WorldError),
    /// An actor thread could not be started.
    #[error("failed to start actor '{name}'")]
    Spawn {
        /// Name of the actor.
        name: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
}

/// How a game ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Exactly one player survived.
    Winner {
        /// Identifier of the survivor.
        id: PlayerId,
        /// Name of the survivor.
        name: String,
    },
    /// Nobody survived.
    Draw,
    /// The user quit or the input source failed.
    Interrupted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Winner { name, .. } => write!(f, "{name} won, all other players are dead"),
            Self::Draw => f.write_str("draw, all players are dead"),
            Self::Interrupted => f.write_str("game interrupted"),
        }
    }
}

fn spawn_failed(name: &str) -> impl FnOnce(io::Error) -> GameError + '_ {
    move |source| GameError::Spawn {
        name: name.to_owned(),
        source,
    }
}

struct Seat {
    player: PlayerId,
    actor: Box<dyn Actor>,
}

/// A running match.
pub struct Game {
    world: World,
    scheduler: Scheduler<BombAction>,
    config: GameConfig,
    seats: Vec<Seat>,
    human_input: Option<Sender<Move>>,
    viewport: Option<(u16, u16)>,
    done: bool,
}

impl Game {
    /// Creates a game over `world` with no actor seated yet.
    #[must_use]
    pub fn new(world: World, config: GameConfig) -> Self {
        Self {
            world,
            scheduler: Scheduler::new(),
            config,
            seats: Vec::new(),
            human_input: None,
            viewport: None,
            done: false,
        }
    }

    /// Generates an arena and seats the four standard players.
    ///
    /// `p1` is driven by [`UiEvent`] keys, `p2` plays at random, `p3` wanders
    /// without bombs and `p4` never moves.
    pub fn standard(config: GameConfig, seed: u64) -> Result<Self, GameError> {
        let world = generation::generate(&config, seed, &STANDARD_PLAYERS)?;
        let turn_duration = config.tick_period();
        let mut game = Self::new(world, config);
        let [human, random, wanderer, immobile] = STANDARD_PLAYERS;
        let (keys, input) = crossbeam_channel::bounded(1);
        game.human_input = Some(keys);

        let mut actors: Vec<Box<dyn Actor>> = Vec::with_capacity(STANDARD_PLAYERS.len());
        actors.push(Box::new(
            InputActor::spawn(human, input).map_err(spawn_failed(human))?,
        ));
        actors.push(Box::new(
            RandomActor::spawn(random, turn_duration, seed.wrapping_add(1))
                .map_err(spawn_failed(random))?,
        ));
        actors.push(Box::new(
            WanderingActor::spawn(wanderer, turn_duration, seed.wrapping_add(2))
                .map_err(spawn_failed(wanderer))?,
        ));
        actors.push(Box::new(ImmobileActor::new(immobile)));

        let ids: Vec<_> = game.world.players().map(|player| player.id()).collect();
        for (id, actor) in ids.into_iter().zip(actors) {
            game.seat(id, actor);
        }
        Ok(game)
    }

    /// Hands control of `player` to `actor`.
    pub fn seat(&mut self, player: PlayerId, actor: Box<dyn Actor>) {
        log::debug!("seating '{}' as {player}", actor.name());
        self.seats.push(Seat { player, actor });
    }

    /// Routes decoded key moves to `input`, typically an [`InputActor`]'s source.
    pub fn set_human_input(&mut self, input: Sender<Move>) {
        self.human_input = Some(input);
    }

    /// Current world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Scheduler holding the pending bomb stages.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler<BombAction> {
        &self.scheduler
    }

    /// Last display size reported by the UI.
    #[must_use]
    pub const fn viewport(&self) -> Option<(u16, u16)> {
        self.viewport
    }

    /// Runs ticks at the configured period until the game ends.
    pub fn run(
        &mut self,
        events: &Receiver<UiEvent>,
        renderer: &mut dyn Renderer,
    ) -> Result<Outcome, GameError> {
        let ticker = crossbeam_channel::tick(self.config.tick_period());
        log::info!("starting game with {} players", self.seats.len());
        loop {
            let _ = ticker.recv();
            if let Some(outcome) = self.tick(events, renderer)? {
                log::info!("{outcome}");
                return Ok(outcome);
            }
        }
    }

    /// Executes one tick. Returns the outcome once the game is over.
    pub fn tick(
        &mut self,
        events: &Receiver<UiEvent>,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<Outcome>, GameError> {
        self.receive_event(events);
        if self.done {
            log::info!("game requested to stop");
            return Ok(Some(Outcome::Interrupted));
        }

        self.run_schedule()?;
        self.apply_moves()?;

        renderer.draw(&Frame {
            world: &self.world,
            turn: self.scheduler.now(),
            viewport: self.viewport,
        });

        self.broadcast();
        Ok(self.outcome())
    }

    fn receive_event(&mut self, events: &Receiver<UiEvent>) {
        let event = match events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => return,
        };

        match event {
            UiEvent::Key(key) if is_quit(key) => self.done = true,
            UiEvent::Key(key) => {
                let (Some(intent), Some(input)) = (decode_move(key), &self.human_input) else {
                    return;
                };
                if let Err(error) = input.try_send(intent) {
                    log::trace!("dropping {intent} for the human player: {error}");
                }
            }
            UiEvent::Resize { width, height } => self.viewport = Some((width, height)),
            UiEvent::Error(message) => {
                log::error!("input failed: {message}");
                self.done = true;
            }
        }
    }

    fn run_schedule(&mut self) -> Result<(), WorldError> {
        if !self.scheduler.has_pending() {
            return Ok(());
        }
        let Self {
            world,
            scheduler,
            config,
            ..
        } = self;
        scheduler.advance();
        scheduler.run_due(|action, turns_done, registrar| {
            bombs::resolve(world, action, turns_done, config, registrar)
        })
    }

    fn apply_moves(&mut self) -> Result<(), WorldError> {
        for seat in &self.seats {
            if !self.world.player(seat.player).is_some_and(|player| player.alive()) {
                continue;
            }
            let Ok(intent) = seat.actor.pending_move().try_recv() else {
                continue;
            };
            log::trace!("[{}] {intent}", seat.actor.name());
            self.world
                .apply_move(seat.player, intent, &self.config, &mut self.scheduler)?;
        }
        Ok(())
    }

    fn broadcast(&self) {
        let board = Arc::new(self.world.board_view());
        let turn = self.scheduler.now();
        for seat in &self.seats {
            let Some(state) =
                self.world
                    .snapshot(seat.player, turn, self.config.tick_period(), &board)
            else {
                continue;
            };
            match seat.actor.inbox().try_send(state) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    log::trace!("[{}] not listening, snapshot dropped", seat.actor.name());
                }
                Err(TrySendError::Disconnected(_)) => {
                    log::trace!("[{}] gone, snapshot dropped", seat.actor.name());
                }
            }
        }
    }

    fn outcome(&self) -> Option<Outcome> {
        let mut living = self.world.living_players();
        match (living.next(), living.next()) {
            (None, _) => Some(Outcome::Draw),
            (Some(survivor), None) => Some(Outcome::Winner {
                id: survivor.id(),
                name: survivor.name().to_owned(),
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("turn", &self.scheduler.now())
            .field("seats", &self.seats.len())
            .field("pending", &self.scheduler.pending())
            .field("done", &self.done)
            .finish()
    }
}
