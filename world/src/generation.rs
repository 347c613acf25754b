//! Seeded arena generation.
//!
//! The arena is framed by walls with a pillar on every cell whose column and
//! row are both even. Rocks are scattered over the remaining ground, a square
//! around every spawn point is cleared again, and power-ups from a finite pool
//! are hidden underneath the surviving rocks.

use bomberman_core::{CellCoord, GameConfig, Occupant};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{Board, World, WorldError};

/// Spawn points for up to four players, in corner order.
#[must_use]
pub fn spawn_points(columns: u32, rows: u32) -> [CellCoord; 4] {
    let right = columns.saturating_sub(2);
    let bottom = rows.saturating_sub(2);
    [
        CellCoord::new(1, 1),
        CellCoord::new(right, bottom),
        CellCoord::new(1, bottom),
        CellCoord::new(right, 1),
    ]
}

/// Generates an arena and spawns one player per name at the corners.
///
/// Names beyond the fourth are ignored.
pub fn generate(config: &GameConfig, seed: u64, names: &[&str]) -> Result<World, WorldError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut board = Board::new(config.columns, config.rows);

    let free_cells = place_walls(&mut board);
    let rocks_placed = place_rocks(&mut board, &mut rng, free_cells, config.rock_density);

    let mut world = World::new(board);
    let mut rocks_cleared = 0;
    let spawns = spawn_points(config.columns, config.rows);
    for (name, at) in names.iter().zip(spawns) {
        world.board_mut().scan_square(at, config.rock_free_radius, |_, cell| {
            if cell.top() == Occupant::Rock {
                let _ = cell.pop();
                rocks_cleared += 1;
            }
        });
        let _ = world.spawn_player(
            *name,
            at,
            config.default_max_bombs,
            config.default_blast_radius,
        )?;
    }

    let rocks_left = rocks_placed.saturating_sub(rocks_cleared);
    hide_power_ups(world.board_mut(), &mut rng, rocks_left, config);
    log::debug!(
        "generated {}x{} arena with {} rocks",
        config.columns,
        config.rows,
        rocks_left
    );
    Ok(world)
}

fn place_walls(board: &mut Board) -> u32 {
    let (columns, rows) = board.dimensions();
    let mut free = 0;
    let coords: Vec<_> = board.coords().collect();
    for coord in coords {
        let (column, row) = (coord.column(), coord.row());
        let border = column == 0 || row == 0 || column + 1 == columns || row + 1 == rows;
        let pillar = column % 2 == 0 && row % 2 == 0;
        match board.cell_mut(coord) {
            Some(cell) if border || pillar => cell.push(Occupant::Wall),
            Some(_) => free += 1,
            None => {}
        }
    }
    free
}

fn place_rocks(board: &mut Board, rng: &mut ChaCha8Rng, free_cells: u32, density: f64) -> u32 {
    let mut needed = f64::from(free_cells) * density;
    let mut placed = 0;
    let coords: Vec<_> = board.coords().collect();
    for coord in coords {
        let Some(cell) = board.cell_mut(coord) else {
            continue;
        };
        if cell.top() != Occupant::Ground {
            continue;
        }
        if free_cells > 0 && rng.gen::<f64>() < needed / f64::from(free_cells) {
            needed -= 1.0;
            placed += 1;
            cell.push(Occupant::Rock);
        }
    }
    placed
}

fn hide_power_ups(board: &mut Board, rng: &mut ChaCha8Rng, rocks: u32, config: &GameConfig) {
    let mut bomb_rocks_left = rocks / 2;
    let mut radius_rocks_left = rocks / 2;
    let mut bomb_left = config.total_bomb_power_ups;
    let mut radius_left = config.total_radius_power_ups;

    let coords: Vec<_> = board.coords().collect();
    for coord in coords {
        let Some(cell) = board.cell_mut(coord) else {
            continue;
        };
        if cell.top() != Occupant::Rock {
            continue;
        }
        let _ = cell.pop();
        if rng.gen_bool(0.5) {
            if rng.gen::<f64>() < chance(radius_left, radius_rocks_left) {
                radius_left -= 1;
                cell.push(Occupant::RadiusPowerUp);
            }
            radius_rocks_left = radius_rocks_left.saturating_sub(1);
        } else {
            if rng.gen::<f64>() < chance(bomb_left, bomb_rocks_left) {
                bomb_left -= 1;
                cell.push(Occupant::BombPowerUp);
            }
            bomb_rocks_left = bomb_rocks_left.saturating_sub(1);
        }
        cell.push(Occupant::Rock);
    }
}

fn chance(remaining: u32, candidates: u32) -> f64 {
    match (remaining, candidates) {
        (0, _) => 0.0,
        (_, 0) => 1.0,
        _ => f64::from(remaining) / f64::from(candidates),
    }
}
