#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Bomberman engine.
//!
//! This crate defines the vocabulary that connects the authoritative world,
//! the turn loop, and the concurrently running actors. Actors only ever emit
//! [`Move`] intents and only ever observe [`PlayerState`] snapshots; the world
//! is described to them through a read-only [`BoardView`] that exposes the
//! display name of the topmost occupant of every cell.

use std::{error::Error, fmt, str::FromStr, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

/// Cardinal directions available to movement and blast propagation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All four directions in the order blasts are resolved.
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::South,
        Direction::North,
    ];

    /// Returns the neighbouring cell in this direction, if it does not underflow.
    ///
    /// Upper bounds are not checked here; the board rejects cells outside of
    /// its dimensions.
    #[must_use]
    pub fn step(self, from: CellCoord) -> Option<CellCoord> {
        match self {
            Self::North => from
                .row()
                .checked_sub(1)
                .map(|row| CellCoord::new(from.column(), row)),
            Self::South => from
                .row()
                .checked_add(1)
                .map(|row| CellCoord::new(from.column(), row)),
            Self::West => from
                .column()
                .checked_sub(1)
                .map(|column| CellCoord::new(column, from.row())),
            Self::East => from
                .column()
                .checked_add(1)
                .map(|column| CellCoord::new(column, from.row())),
        }
    }
}

/// Intents an actor may emit. Nothing else ever travels from an actor to the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    /// Step one cell toward decreasing rows.
    Up,
    /// Step one cell toward increasing rows.
    Down,
    /// Step one cell toward decreasing columns.
    Left,
    /// Step one cell toward increasing columns.
    Right,
    /// Drop a bomb on the current cell.
    #[serde(rename = "bomb")]
    PlaceBomb,
}

impl Move {
    /// Every move in the vocabulary.
    pub const ALL: [Move; 5] = [
        Move::Up,
        Move::Down,
        Move::Left,
        Move::Right,
        Move::PlaceBomb,
    ];

    /// Direction of travel for directional moves, `None` for bomb placement.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Up => Some(Direction::North),
            Self::Down => Some(Direction::South),
            Self::Left => Some(Direction::West),
            Self::Right => Some(Direction::East),
            Self::PlaceBomb => None,
        }
    }

    /// Canonical wire spelling of the move.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::PlaceBomb => "bomb",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "bomb" | "place-bomb" => Ok(Self::PlaceBomb),
            other => Err(ParseMoveError(other.to_owned())),
        }
    }
}

/// Error returned when a string does not name a [`Move`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseMoveError(String);

impl fmt::Display for ParseMoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown move `{}`", self.0)
    }
}

impl Error for ParseMoveError {}

/// Unique identifier assigned to a player by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Location of a single board cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new board cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Everything that can occupy a layer of a board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occupant {
    /// Empty floor. Used as the base layer of every cell.
    Ground,
    /// Indestructible wall. Blocks movement and blasts.
    Wall,
    /// Destructible rock. Blocks movement, absorbs blasts.
    Rock,
    /// Armed bomb. Blocks movement.
    Bomb,
    /// Active flame left by an explosion. Lethal to enter.
    Flame,
    /// Power-up granting one more concurrent bomb.
    BombPowerUp,
    /// Power-up extending the blast radius by one.
    RadiusPowerUp,
    /// Marker of the player standing on the cell.
    Player(PlayerId),
}

impl Occupant {
    /// Reports whether a player may step onto a cell topped by this occupant.
    #[must_use]
    pub const fn traversable(self) -> bool {
        !matches!(self, Self::Wall | Self::Rock | Self::Bomb)
    }

    /// Reports whether the occupant is a collectible power-up.
    #[must_use]
    pub const fn is_power_up(self) -> bool {
        matches!(self, Self::BombPowerUp | Self::RadiusPowerUp)
    }

    /// Display name of the occupant. Player markers are named by the world.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ground => "Ground",
            Self::Wall => "Wall",
            Self::Rock => "Rock",
            Self::Bomb => "Bomb",
            Self::Flame => "Flame",
            Self::BombPowerUp => "PowerUp(Bomb)",
            Self::RadiusPowerUp => "PowerUp(Radius)",
            Self::Player(_) => "Player",
        }
    }
}

/// Read-only export of the board handed to actors.
///
/// Each cell exposes only the display name of its topmost occupant, never the
/// full layer stack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoardView {
    columns: u32,
    rows: u32,
    names: Vec<String>,
}

impl BoardView {
    /// Creates a view from row-major cell names.
    ///
    /// Returns `None` when the number of names does not match the dimensions.
    #[must_use]
    pub fn from_names(columns: u32, rows: u32, names: Vec<String>) -> Option<Self> {
        let expected = u64::from(columns) * u64::from(rows);
        if u64::try_from(names.len()).ok()? != expected {
            return None;
        }
        Some(Self {
            columns,
            rows,
            names,
        })
    }

    /// Provides the dimensions of the exported board as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Display name of the topmost occupant at `cell`.
    #[must_use]
    pub fn name_at(&self, cell: CellCoord) -> Option<&str> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        self.names.get(row * width + column).map(String::as_str)
    }
}

/// Snapshot of one player's state broadcast to its actor once per tick.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    /// Scheduler turn at which the snapshot was taken.
    pub turn: u64,
    /// Real-time period of one tick of the turn loop.
    pub turn_duration: Duration,
    /// Name of the player.
    pub name: String,
    /// Cell currently occupied by the player.
    pub position: CellCoord,
    /// Cell occupied before the last applied move.
    pub last_position: CellCoord,
    /// Bombs currently placed and not yet replenished.
    pub bombs: u32,
    /// Maximum number of bombs that may be live at once.
    pub max_bombs: u32,
    /// Blast radius applied to newly placed bombs.
    pub max_radius: u32,
    /// Whether the player is still in the game.
    pub alive: bool,
    /// Read-only export of the board, shared between all snapshots of a tick.
    pub board: Arc<BoardView>,
}

/// Tunable parameters for timing, player defaults and arena generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Real-time period of one turn loop tick, in milliseconds.
    pub tick_millis: u64,
    /// Turns between bomb placement and its explosion.
    pub turns_to_explode: u64,
    /// Turns between an explosion and the extinction of its flames.
    pub turns_to_flameout: u64,
    /// Turns between bomb placement and the return of the bomb slot.
    pub turns_to_replenish: u64,
    /// Concurrent bomb allowance granted to every player at spawn.
    pub default_max_bombs: u32,
    /// Blast radius granted to every player at spawn.
    pub default_blast_radius: u32,
    /// Number of board columns, border walls included.
    pub columns: u32,
    /// Number of board rows, border walls included.
    pub rows: u32,
    /// Fraction of free cells that receive a rock.
    pub rock_density: f64,
    /// Half-width of the square kept clear of rocks around every spawn.
    pub rock_free_radius: u32,
    /// Bomb power-ups available for hiding under rocks.
    pub total_bomb_power_ups: u32,
    /// Radius power-ups available for hiding under rocks.
    pub total_radius_power_ups: u32,
}

impl GameConfig {
    /// Real-time period of one tick.
    #[must_use]
    pub const fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_millis: 10,
            turns_to_explode: 200,
            turns_to_flameout: 70,
            turns_to_replenish: 250,
            default_max_bombs: 3,
            default_blast_radius: 3,
            columns: 51,
            rows: 23,
            rock_density: 0.5,
            rock_free_radius: 1,
            total_bomb_power_ups: 20,
            total_radius_power_ups: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_parse_from_their_display_form() {
        for mv in Move::ALL {
            assert_eq!(mv.to_string().parse::<Move>(), Ok(mv));
        }
        assert_eq!("place-bomb".parse::<Move>(), Ok(Move::PlaceBomb));
        assert!("jump".parse::<Move>().is_err());
    }

    #[test]
    fn only_bomb_placement_lacks_a_direction() {
        let directionless: Vec<_> = Move::ALL
            .into_iter()
            .filter(|mv| mv.direction().is_none())
            .collect();
        assert_eq!(directionless, vec![Move::PlaceBomb]);
    }

    #[test]
    fn direction_step_refuses_to_underflow() {
        let origin = CellCoord::new(0, 0);
        assert_eq!(Direction::North.step(origin), None);
        assert_eq!(Direction::West.step(origin), None);
        assert_eq!(Direction::South.step(origin), Some(CellCoord::new(0, 1)));
        assert_eq!(Direction::East.step(origin), Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn blocking_occupants_are_not_traversable() {
        assert!(!Occupant::Wall.traversable());
        assert!(!Occupant::Rock.traversable());
        assert!(!Occupant::Bomb.traversable());
        assert!(Occupant::Flame.traversable());
        assert!(Occupant::RadiusPowerUp.traversable());
        assert!(Occupant::Player(PlayerId::new(0)).traversable());
    }

    #[test]
    fn board_view_rejects_mismatched_dimensions() {
        assert!(BoardView::from_names(2, 2, vec!["Ground".to_owned(); 3]).is_none());

        let names = vec![
            "Wall".to_owned(),
            "Ground".to_owned(),
            "p1".to_owned(),
            "Flame".to_owned(),
        ];
        let view = BoardView::from_names(2, 2, names).expect("matching dimensions");
        assert_eq!(view.name_at(CellCoord::new(0, 1)), Some("p1"));
        assert_eq!(view.name_at(CellCoord::new(2, 0)), None);
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: GameConfig = toml::from_str(
            r#"
                tick_millis = 25
                turns_to_explode = 40
            "#,
        )
        .expect("config parses");

        assert_eq!(config.tick_period(), Duration::from_millis(25));
        assert_eq!(config.turns_to_explode, 40);
        assert_eq!(config.turns_to_flameout, GameConfig::default().turns_to_flameout);
        assert_eq!(config.columns, 51);
    }
}
