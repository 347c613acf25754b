//! Crossterm front end: raw-mode guard, key pump and text renderer.

use std::{
    fmt::Write as _,
    io::{self, Write as _},
    thread,
};

use bomberman_core::{CellCoord, Occupant};
use bomberman_system_turn_loop::{Frame, Key, Renderer, UiEvent};
use bomberman_world::World;
use crossbeam_channel::Sender;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, terminal,
};

/// Keeps the terminal in raw mode on the alternate screen while alive.
pub(crate) struct TerminalGuard;

impl TerminalGuard {
    pub(crate) fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Starts the thread translating terminal events into [`UiEvent`]s.
///
/// The current terminal size is reported first.
pub(crate) fn spawn_input_pump(events: Sender<UiEvent>) -> io::Result<()> {
    let _ = thread::Builder::new()
        .name("ui-input".to_owned())
        .spawn(move || {
            if let Ok((width, height)) = terminal::size() {
                let _ = events.send(UiEvent::Resize { width, height });
            }
            pump(&events);
        })?;
    Ok(())
}

fn pump(events: &Sender<UiEvent>) {
    loop {
        let event = match event::read() {
            Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => match translate(key) {
                Some(key) => UiEvent::Key(key),
                None => continue,
            },
            Ok(Event::Resize(width, height)) => UiEvent::Resize { width, height },
            Ok(_) => continue,
            Err(error) => {
                let _ = events.send(UiEvent::Error(error.to_string()));
                return;
            }
        };
        if events.send(event).is_err() {
            return;
        }
    }
}

fn translate(key: KeyEvent) -> Option<Key> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::CtrlC),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Char(' ') => Some(Key::Space),
        KeyCode::Esc => Some(Key::Char('q')),
        KeyCode::Char(other) => Some(Key::Char(other.to_ascii_lowercase())),
        _ => None,
    }
}

fn glyph(occupant: Occupant) -> char {
    match occupant {
        Occupant::Ground => ' ',
        Occupant::Wall => '#',
        Occupant::Rock => '%',
        Occupant::Bomb => 'o',
        Occupant::Flame => '*',
        Occupant::BombPowerUp => 'B',
        Occupant::RadiusPowerUp => 'R',
        Occupant::Player(id) => id
            .get()
            .checked_add(1)
            .and_then(|digit| char::from_digit(digit, 10))
            .unwrap_or('@'),
    }
}

/// Draws the board, clipped to the viewport, followed by one status line per player.
fn compose(world: &World, turn: u64, viewport: Option<(u16, u16)>) -> String {
    let (columns, rows) = world.board().dimensions();
    let (max_columns, max_rows) = viewport.map_or((columns, rows), |(width, height)| {
        (u32::from(width), u32::from(height))
    });

    let mut out = String::new();
    for row in 0..rows.min(max_rows) {
        for column in 0..columns.min(max_columns) {
            let top = world
                .board()
                .cell(CellCoord::new(column, row))
                .map_or(Occupant::Ground, |cell| cell.top());
            out.push(glyph(top));
        }
        out.push_str("\r\n");
    }

    let _ = write!(out, "turn {turn}\r\n");
    for player in world.players() {
        let _ = write!(
            out,
            "{} {} bombs {}/{} radius {}{}\r\n",
            glyph(Occupant::Player(player.id())),
            player.name(),
            player.bombs(),
            player.max_bombs(),
            player.max_radius(),
            if player.alive() { "" } else { " (dead)" },
        );
    }
    out
}

/// Text renderer writing whole frames to standard output.
pub(crate) struct TerminalRenderer {
    stdout: io::Stdout,
}

impl TerminalRenderer {
    pub(crate) fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }

    fn present(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        let text = compose(frame.world, frame.turn, frame.viewport);
        let mut lock = self.stdout.lock();
        execute!(lock, cursor::MoveTo(0, 0), terminal::Clear(terminal::ClearType::All))?;
        lock.write_all(text.as_bytes())?;
        lock.flush()
    }
}

impl Renderer for TerminalRenderer {
    fn draw(&mut self, frame: &Frame<'_>) {
        if let Err(error) = self.present(frame) {
            log::warn!("failed to draw turn {}: {error}", frame.turn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomberman_core::PlayerId;
    use bomberman_world::Board;

    #[test]
    fn control_c_is_distinguished_from_c() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let plain_c = KeyEvent::new(KeyCode::Char('C'), KeyModifiers::SHIFT);

        assert_eq!(translate(ctrl_c), Some(Key::CtrlC));
        assert_eq!(translate(plain_c), Some(Key::Char('c')));
        assert_eq!(
            translate(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
            Some(Key::Char('q'))
        );
    }

    #[test]
    fn players_are_drawn_by_number() {
        assert_eq!(glyph(Occupant::Player(PlayerId::new(0))), '1');
        assert_eq!(glyph(Occupant::Player(PlayerId::new(3))), '4');
        assert_eq!(glyph(Occupant::Player(PlayerId::new(12))), '@');
    }

    #[test]
    fn frame_is_clipped_to_the_viewport() {
        let mut world = World::new(Board::new(6, 4));
        let _ = world
            .spawn_player("p1", CellCoord::new(1, 1), 1, 1)
            .expect("spawn on board");

        let text = compose(&world, 7, Some((3, 2)));
        let lines: Vec<_> = text.split("\r\n").collect();
        assert_eq!(lines[0], "   ");
        assert_eq!(lines[1], " 1 ");
        assert_eq!(lines[2], "turn 7");
        assert_eq!(lines[3], "1 p1 bombs 0/1 radius 1");
    }
}
