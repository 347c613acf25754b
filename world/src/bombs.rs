//! Bomb lifecycle built on top of the turn scheduler.
//!
//! Placing a bomb snapshots the placer's position and blast radius and
//! registers two independent follow-ups: the explosion and the return of the
//! bomb slot. The explosion in turn registers the flameout. Each stage is a
//! separate scheduled [`BombAction`], so a short flame never delays the slot
//! refill and vice versa.

use std::cmp::Ordering;

use bomberman_core::{CellCoord, GameConfig, Occupant, PlayerId};
use bomberman_scheduler::{Action, Register};

use crate::{board::Scan, World, WorldError};

/// Scheduled stage of a placed bomb.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BombAction {
    /// Detonates the bomb at `origin` with the radius captured at placement.
    Explode {
        /// Player that placed the bomb.
        owner: PlayerId,
        /// Cell the bomb was placed on.
        origin: CellCoord,
        /// Blast radius captured when the bomb was placed.
        radius: u32,
    },
    /// Extinguishes the flames left behind by an explosion.
    Flameout {
        /// Player that placed the bomb.
        owner: PlayerId,
        /// Cells the explosion set alight.
        cells: Vec<CellCoord>,
    },
    /// Hands the bomb slot back to its owner.
    Replenish {
        /// Player that placed the bomb.
        owner: PlayerId,
    },
}

impl BombAction {
    /// Player the bomb belongs to.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        match self {
            Self::Explode { owner, .. }
            | Self::Flameout { owner, .. }
            | Self::Replenish { owner } => *owner,
        }
    }

    /// Short name of the stage, used in logs.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Explode { .. } => "explosion",
            Self::Flameout { .. } => "flameout",
            Self::Replenish { .. } => "replenish",
        }
    }
}

impl Action for BombAction {
    fn duration(&self) -> u32 {
        1
    }
}

/// Attempts to place a bomb under `owner`.
///
/// Returns `Ok(false)` when the owner already has every bomb out. Holding
/// more bombs than allowed is a broken invariant and reported as an error.
pub fn place_bomb<R>(
    world: &mut World,
    owner: PlayerId,
    config: &GameConfig,
    registrar: &mut R,
) -> Result<bool, WorldError>
where
    R: Register<BombAction>,
{
    let player = world.player_mut(owner)?;
    log::debug!(
        "[{}] attempting to place bomb ({}/{})",
        player.name,
        player.bombs,
        player.max_bombs
    );

    match player.bombs.cmp(&player.max_bombs) {
        Ordering::Greater => {
            return Err(WorldError::BombCountExceeded {
                player: player.name.clone(),
                bombs: player.bombs,
                max_bombs: player.max_bombs,
            });
        }
        Ordering::Equal => {
            log::debug!("[{}] no bomb left to place", player.name);
            return Ok(false);
        }
        Ordering::Less => {}
    }

    player.bombs += 1;
    let origin = player.position;
    let radius = player.max_radius;

    world
        .board
        .cell_mut(origin)
        .ok_or(WorldError::OutOfBounds(origin))?
        .push(Occupant::Bomb);

    registrar.register(
        BombAction::Explode {
            owner,
            origin,
            radius,
        },
        config.turns_to_explode,
    );
    registrar.register(BombAction::Replenish { owner }, config.turns_to_replenish);
    Ok(true)
}

/// Executes one scheduled bomb stage against the world.
pub fn resolve<R>(
    world: &mut World,
    action: &BombAction,
    turns_done: u32,
    config: &GameConfig,
    registrar: &mut R,
) -> Result<(), WorldError>
where
    R: Register<BombAction>,
{
    log::debug!(
        "[{}] {} turn {}/{}",
        world.player_name(action.owner()),
        action.stage(),
        turns_done,
        action.duration()
    );

    match action {
        BombAction::Explode {
            owner,
            origin,
            radius,
        } => {
            let cells = explode(world, *origin, *radius)?;
            registrar.register(
                BombAction::Flameout {
                    owner: *owner,
                    cells,
                },
                config.turns_to_flameout,
            );
            Ok(())
        }
        BombAction::Flameout { cells, .. } => {
            extinguish(world, cells);
            Ok(())
        }
        BombAction::Replenish { owner } => replenish(world, *owner),
    }
}

fn explode(world: &mut World, origin: CellCoord, radius: u32) -> Result<Vec<CellCoord>, WorldError> {
    let World { board, players } = world;

    let bomb_cell = board
        .cell_mut(origin)
        .ok_or(WorldError::OutOfBounds(origin))?;
    if !bomb_cell.remove(Occupant::Bomb) {
        log::warn!("no bomb left to detonate at {origin}");
    }

    let mut alight = Vec::new();
    let mut fault = None;
    board.scan_cross(origin, radius, |coord, cell| {
        for player in players.iter_mut() {
            if !player.alive || player.position != coord {
                continue;
            }
            log::info!("[{}] dying in explosion at {coord}", player.name);
            player.alive = false;
            if !cell.remove(Occupant::Player(player.id)) && fault.is_none() {
                fault = Some(WorldError::MarkerMissing {
                    player: player.name.clone(),
                    cell: coord,
                });
            }
        }

        alight.push(coord);
        match cell.top() {
            Occupant::Rock | Occupant::BombPowerUp | Occupant::RadiusPowerUp => {
                let _ = cell.pop();
                cell.push(Occupant::Flame);
                Scan::Stop
            }
            _ => {
                cell.push(Occupant::Flame);
                Scan::Continue
            }
        }
    });

    match fault {
        Some(error) => Err(error),
        None => Ok(alight),
    }
}

fn extinguish(world: &mut World, cells: &[CellCoord]) {
    for coord in cells {
        let Some(cell) = world.board.cell_mut(*coord) else {
            continue;
        };
        if cell.remove(Occupant::Flame) && cell.top() == Occupant::Rock {
            let _ = cell.pop();
        }
    }
}

fn replenish(world: &mut World, owner: PlayerId) -> Result<(), WorldError> {
    let player = world.player_mut(owner)?;
    if player.bombs > 0 {
        player.bombs -= 1;
    } else {
        log::error!(
            "[{}] replenishing with no bomb out ({}/{})",
            player.name,
            player.bombs,
            player.max_bombs
        );
    }
    Ok(())
}
