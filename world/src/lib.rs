#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Bomberman.
//!
//! The world owns the board and the authoritative state of every player. It
//! is mutated by exactly one caller, the turn loop, either by applying a move
//! on behalf of an actor or by resolving a scheduled [`bombs::BombAction`].

pub mod bombs;
pub mod generation;

mod board;

use std::{sync::Arc, time::Duration};

use bomberman_core::{BoardView, CellCoord, GameConfig, Move, Occupant, PlayerId, PlayerState};
use bomberman_scheduler::Register;

pub use board::{Board, Cell, Scan};
use bombs::BombAction;

/// Broken invariants detected while mutating the world.
///
/// Every variant indicates a programming error; callers are expected to stop
/// the simulation rather than recover.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// A player holds more live bombs than its allowance.
    #[error("'{player}' has {bombs}/{max_bombs} bombs")]
    BombCountExceeded {
        /// Name of the offending player.
        player: String,
        /// Live bombs held by the player.
        bombs: u32,
        /// Bomb allowance of the player.
        max_bombs: u32,
    },
    /// A player's marker was not found on the cell it is recorded at.
    #[error("'{player}' not found on its cell {cell}")]
    MarkerMissing {
        /// Name of the offending player.
        player: String,
        /// Cell the player is recorded at.
        cell: CellCoord,
    },
    /// No player is registered under the identifier.
    #[error("no player registered as {0}")]
    UnknownPlayer(PlayerId),
    /// A coordinate lies outside of the board.
    #[error("cell {0} lies outside of the board")]
    OutOfBounds(CellCoord),
}

/// Authoritative state of one player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub(crate) id: PlayerId,
    pub(crate) name: String,
    pub(crate) position: CellCoord,
    pub(crate) last_position: CellCoord,
    pub(crate) bombs: u32,
    pub(crate) max_bombs: u32,
    pub(crate) max_radius: u32,
    pub(crate) alive: bool,
}

impl Player {
    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Name of the player.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cell currently occupied by the player.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        self.position
    }

    /// Cell occupied before the last applied move.
    #[must_use]
    pub const fn last_position(&self) -> CellCoord {
        self.last_position
    }

    /// Bombs currently out.
    #[must_use]
    pub const fn bombs(&self) -> u32 {
        self.bombs
    }

    /// Maximum number of bombs that may be out at once.
    #[must_use]
    pub const fn max_bombs(&self) -> u32 {
        self.max_bombs
    }

    /// Blast radius applied to newly placed bombs.
    #[must_use]
    pub const fn max_radius(&self) -> u32 {
        self.max_radius
    }

    /// Whether the player is still in the game.
    #[must_use]
    pub const fn alive(&self) -> bool {
        self.alive
    }
}

/// Board plus the authoritative state of every player.
#[derive(Clone, Debug)]
pub struct World {
    board: Board,
    players: Vec<Player>,
}

impl World {
    /// Creates a world without players on top of `board`.
    #[must_use]
    pub fn new(board: Board) -> Self {
        Self {
            board,
            players: Vec::new(),
        }
    }

    /// Adds a living player at `at` and places its marker on the board.
    pub fn spawn_player(
        &mut self,
        name: impl Into<String>,
        at: CellCoord,
        max_bombs: u32,
        max_radius: u32,
    ) -> Result<PlayerId, WorldError> {
        let id = PlayerId::new(u32::try_from(self.players.len()).unwrap_or(u32::MAX));
        self.board
            .cell_mut(at)
            .ok_or(WorldError::OutOfBounds(at))?
            .push(Occupant::Player(id));
        self.players.push(Player {
            id,
            name: name.into(),
            position: at,
            last_position: at,
            bombs: 0,
            max_bombs,
            max_radius,
            alive: true,
        });
        Ok(id)
    }

    /// Read-only access to the board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access to the board for setup and collaborators.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Player registered under `id`.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.players.get(index))
    }

    /// All players in identifier order, dead ones included.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Players that are still alive.
    pub fn living_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|player| player.alive)
    }

    /// Exports the board with player markers named after their players.
    #[must_use]
    pub fn board_view(&self) -> BoardView {
        self.board.export(|occupant| match occupant {
            Occupant::Player(id) => self
                .player(id)
                .map_or_else(|| occupant.label().to_owned(), |player| player.name.clone()),
            other => other.label().to_owned(),
        })
    }

    /// Builds the snapshot broadcast to the actor controlling `id`.
    #[must_use]
    pub fn snapshot(
        &self,
        id: PlayerId,
        turn: u64,
        turn_duration: Duration,
        board: &Arc<BoardView>,
    ) -> Option<PlayerState> {
        let player = self.player(id)?;
        Some(PlayerState {
            turn,
            turn_duration,
            name: player.name.clone(),
            position: player.position,
            last_position: player.last_position,
            bombs: player.bombs,
            max_bombs: player.max_bombs,
            max_radius: player.max_radius,
            alive: player.alive,
            board: Arc::clone(board),
        })
    }

    /// Applies one move on behalf of `id`.
    ///
    /// Blocked moves and bomb requests at capacity leave the world untouched.
    /// Entering a flame kills the player, which then leaves the board.
    pub fn apply_move<R>(
        &mut self,
        id: PlayerId,
        intent: Move,
        config: &GameConfig,
        registrar: &mut R,
    ) -> Result<(), WorldError>
    where
        R: Register<BombAction>,
    {
        let player = self.player(id).ok_or(WorldError::UnknownPlayer(id))?;
        if !player.alive {
            return Ok(());
        }
        let from = player.position;

        let Some(direction) = intent.direction() else {
            let _ = bombs::place_bomb(self, id, config, registrar)?;
            return Ok(());
        };

        let Some(next) = direction.step(from) else {
            return Ok(());
        };
        if !self.board.traversable(next) {
            return Ok(());
        }

        if self.board.cell(next).map(Cell::top) == Some(Occupant::Flame) {
            self.vacate(id, from)?;
            let player = self.player_mut(id)?;
            player.alive = false;
            log::info!("[{}] died moving into flame at {next}", player.name);
            return Ok(());
        }

        self.vacate(id, from)?;
        self.collect_power_up(id, next)?;
        self.board
            .cell_mut(next)
            .ok_or(WorldError::OutOfBounds(next))?
            .push(Occupant::Player(id));

        let player = self.player_mut(id)?;
        player.last_position = from;
        player.position = next;
        Ok(())
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, WorldError> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.players.get_mut(index))
            .ok_or(WorldError::UnknownPlayer(id))
    }

    pub(crate) fn player_name(&self, id: PlayerId) -> &str {
        self.player(id).map_or("?", |player| player.name.as_str())
    }

    fn vacate(&mut self, id: PlayerId, at: CellCoord) -> Result<(), WorldError> {
        let removed = self
            .board
            .cell_mut(at)
            .is_some_and(|cell| cell.remove(Occupant::Player(id)));
        if removed {
            Ok(())
        } else {
            Err(WorldError::MarkerMissing {
                player: self.player_name(id).to_owned(),
                cell: at,
            })
        }
    }

    fn collect_power_up(&mut self, id: PlayerId, at: CellCoord) -> Result<(), WorldError> {
        let cell = self.board.cell_mut(at).ok_or(WorldError::OutOfBounds(at))?;
        let power_up = cell.top();
        if !power_up.is_power_up() {
            return Ok(());
        }
        let _ = cell.pop();

        let player = self.player_mut(id)?;
        match power_up {
            Occupant::BombPowerUp => {
                player.max_bombs += 1;
                log::info!("[{}] power-up! max bombs: {}", player.name, player.max_bombs);
            }
            _ => {
                player.max_radius += 1;
                log::info!("[{}] power-up! max radius: {}", player.name, player.max_radius);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomberman_scheduler::Scheduler;

    fn open_world(columns: u32, rows: u32) -> (World, PlayerId) {
        let mut world = World::new(Board::new(columns, rows));
        let id = world
            .spawn_player("p1", CellCoord::new(1, 1), 1, 2)
            .expect("spawn on board");
        (world, id)
    }

    fn push(world: &mut World, at: CellCoord, occupant: Occupant) {
        world
            .board_mut()
            .cell_mut(at)
            .expect("cell on board")
            .push(occupant);
    }

    #[test]
    fn move_updates_position_and_marker() {
        let (mut world, id) = open_world(4, 4);
        let mut scheduler: Scheduler<BombAction> = Scheduler::new();

        world
            .apply_move(id, Move::Right, &GameConfig::default(), &mut scheduler)
            .expect("move applies");

        let player = world.player(id).expect("player exists");
        assert_eq!(player.position(), CellCoord::new(2, 1));
        assert_eq!(player.last_position(), CellCoord::new(1, 1));
        let board = world.board();
        assert_eq!(board.cell(CellCoord::new(1, 1)).map(Cell::top), Some(Occupant::Ground));
        assert_eq!(
            board.cell(CellCoord::new(2, 1)).map(Cell::top),
            Some(Occupant::Player(id))
        );
    }

    #[test]
    fn blocked_move_is_a_no_op() {
        let (mut world, id) = open_world(4, 4);
        push(&mut world, CellCoord::new(1, 0), Occupant::Wall);
        push(&mut world, CellCoord::new(0, 1), Occupant::Rock);
        let mut scheduler: Scheduler<BombAction> = Scheduler::new();

        world
            .apply_move(id, Move::Up, &GameConfig::default(), &mut scheduler)
            .expect("blocked move is not an error");
        world
            .apply_move(id, Move::Left, &GameConfig::default(), &mut scheduler)
            .expect("blocked move is not an error");

        assert_eq!(world.player(id).map(Player::position), Some(CellCoord::new(1, 1)));
    }

    #[test]
    fn stepping_off_the_board_is_a_no_op() {
        let mut world = World::new(Board::new(2, 2));
        let id = world
            .spawn_player("edge", CellCoord::new(0, 0), 1, 1)
            .expect("spawn on board");
        let mut scheduler: Scheduler<BombAction> = Scheduler::new();

        world
            .apply_move(id, Move::Up, &GameConfig::default(), &mut scheduler)
            .expect("edge move is not an error");
        assert_eq!(world.player(id).map(Player::position), Some(CellCoord::new(0, 0)));
    }

    #[test]
    fn entering_flame_kills_and_removes_marker() {
        let (mut world, id) = open_world(4, 4);
        push(&mut world, CellCoord::new(1, 2), Occupant::Flame);
        let mut scheduler: Scheduler<BombAction> = Scheduler::new();

        world
            .apply_move(id, Move::Down, &GameConfig::default(), &mut scheduler)
            .expect("death is not an error");

        let player = world.player(id).expect("player exists");
        assert!(!player.alive());
        assert_eq!(player.position(), CellCoord::new(1, 1), "never placed on the flame");
        let origin = world.board().cell(CellCoord::new(1, 1)).expect("cell");
        assert!(!origin.contains(Occupant::Player(id)));
    }

    #[test]
    fn power_ups_are_collected_on_entry() {
        let (mut world, id) = open_world(5, 3);
        push(&mut world, CellCoord::new(2, 1), Occupant::BombPowerUp);
        push(&mut world, CellCoord::new(3, 1), Occupant::RadiusPowerUp);
        let mut scheduler: Scheduler<BombAction> = Scheduler::new();
        let config = GameConfig::default();

        world
            .apply_move(id, Move::Right, &config, &mut scheduler)
            .expect("move applies");
        world
            .apply_move(id, Move::Right, &config, &mut scheduler)
            .expect("move applies");

        let player = world.player(id).expect("player exists");
        assert_eq!(player.max_bombs(), 2);
        assert_eq!(player.max_radius(), 3);
        let cell = world.board().cell(CellCoord::new(2, 1)).expect("cell");
        assert_eq!(cell.top(), Occupant::Ground, "power-up removed once collected");
    }

    #[test]
    fn missing_marker_is_reported() {
        let (mut world, id) = open_world(4, 4);
        let _ = world
            .board_mut()
            .cell_mut(CellCoord::new(1, 1))
            .expect("cell")
            .pop();
        let mut scheduler: Scheduler<BombAction> = Scheduler::new();

        let error = world
            .apply_move(id, Move::Right, &GameConfig::default(), &mut scheduler)
            .expect_err("marker is gone");
        assert!(matches!(error, WorldError::MarkerMissing { .. }));
    }

    #[test]
    fn missing_marker_leaves_the_power_up_in_place() {
        let (mut world, id) = open_world(4, 4);
        push(&mut world, CellCoord::new(2, 1), Occupant::BombPowerUp);
        let _ = world
            .board_mut()
            .cell_mut(CellCoord::new(1, 1))
            .expect("cell")
            .pop();
        let mut scheduler: Scheduler<BombAction> = Scheduler::new();

        let error = world
            .apply_move(id, Move::Right, &GameConfig::default(), &mut scheduler)
            .expect_err("marker is gone");

        assert!(matches!(error, WorldError::MarkerMissing { .. }));
        let target = world.board().cell(CellCoord::new(2, 1)).expect("cell");
        assert_eq!(target.top(), Occupant::BombPowerUp);
        let player = world.player(id).expect("player exists");
        assert_eq!(player.max_bombs(), 1);
        assert_eq!(player.position(), CellCoord::new(1, 1));
    }

    #[test]
    fn bomb_count_above_allowance_is_fatal() {
        let (mut world, id) = open_world(4, 4);
        world.player_mut(id).expect("player exists").bombs = 2;
        let mut scheduler: Scheduler<BombAction> = Scheduler::new();

        let error = world
            .apply_move(id, Move::PlaceBomb, &GameConfig::default(), &mut scheduler)
            .expect_err("more live bombs than allowed");

        assert!(matches!(
            error,
            WorldError::BombCountExceeded {
                bombs: 2,
                max_bombs: 1,
                ..
            }
        ));
        assert_eq!(world.player(id).map(Player::bombs), Some(2));
        assert_eq!(scheduler.pending(), 0);
        let origin = world.board().cell(CellCoord::new(1, 1)).expect("cell");
        assert!(!origin.contains(Occupant::Bomb));
    }

    #[test]
    fn board_view_names_player_markers() {
        let (world, _) = open_world(3, 3);
        let view = world.board_view();
        assert_eq!(view.name_at(CellCoord::new(1, 1)), Some("p1"));
        assert_eq!(view.name_at(CellCoord::new(0, 0)), Some("Ground"));
    }
}
