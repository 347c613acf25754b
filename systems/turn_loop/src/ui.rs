//! Contracts with the presentation layer: decoded UI events and rendering.

use bomberman_core::Move;
use bomberman_world::World;

/// Key press reported by the input source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Space bar.
    Space,
    /// Control-C.
    CtrlC,
    /// Any other printable character.
    Char(char),
}

/// Event delivered by the user interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    /// A key was pressed.
    Key(Key),
    /// The display area changed size.
    Resize {
        /// New width in character cells.
        width: u16,
        /// New height in character cells.
        height: u16,
    },
    /// The input source failed and will not deliver further events.
    Error(String),
}

/// Maps a key to the move it requests, if any.
///
/// Arrows and `w`/`a`/`s`/`d` walk, space and `b` place a bomb.
#[must_use]
pub const fn decode_move(key: Key) -> Option<Move> {
    match key {
        Key::Up | Key::Char('w') => Some(Move::Up),
        Key::Down | Key::Char('s') => Some(Move::Down),
        Key::Left | Key::Char('a') => Some(Move::Left),
        Key::Right | Key::Char('d') => Some(Move::Right),
        Key::Space | Key::Char('b') => Some(Move::PlaceBomb),
        Key::CtrlC | Key::Char(_) => None,
    }
}

/// Reports whether the key asks to leave the game.
#[must_use]
pub const fn is_quit(key: Key) -> bool {
    matches!(key, Key::CtrlC | Key::Char('q'))
}

/// What a renderer is handed once per tick.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    /// World after this tick's moves and scheduled effects.
    pub world: &'a World,
    /// Current scheduler turn.
    pub turn: u64,
    /// Last reported display size as `(width, height)`, if any.
    pub viewport: Option<(u16, u16)>,
}

/// Presentation collaborator drawing the world once per tick.
pub trait Renderer {
    /// Draws one frame. Rendering problems are the renderer's own business.
    fn draw(&mut self, frame: &Frame<'_>);
}
