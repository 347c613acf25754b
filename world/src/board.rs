//! Layered cell storage and the board grid.

use bomberman_core::{BoardView, CellCoord, Direction, Occupant};

/// Ordered stack of occupants above a fixed base layer.
///
/// The base layer can never be removed, so a cell is never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    base: Occupant,
    layers: Vec<Occupant>,
}

impl Cell {
    /// Creates a cell holding only its base layer.
    #[must_use]
    pub const fn new(base: Occupant) -> Self {
        Self {
            base,
            layers: Vec::new(),
        }
    }

    /// Topmost occupant.
    #[must_use]
    pub fn top(&self) -> Occupant {
        self.layers.last().copied().unwrap_or(self.base)
    }

    /// Places an occupant on top of the stack.
    pub fn push(&mut self, occupant: Occupant) {
        self.layers.push(occupant);
    }

    /// Removes the topmost layer. Returns `None` when only the base remains.
    pub fn pop(&mut self) -> Option<Occupant> {
        self.layers.pop()
    }

    /// Removes the topmost layer equal to `occupant`, wherever it sits above the base.
    pub fn remove(&mut self, occupant: Occupant) -> bool {
        match self.layers.iter().rposition(|layer| *layer == occupant) {
            Some(index) => {
                let _ = self.layers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Reports whether any removable layer equals `occupant`.
    #[must_use]
    pub fn contains(&self, occupant: Occupant) -> bool {
        self.layers.contains(&occupant)
    }

    /// Number of layers, base included.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.layers.len()
    }
}

/// Outcome reported by a cross-scan visitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scan {
    /// Keep walking outward in the current direction.
    Continue,
    /// Stop walking in the current direction.
    Stop,
}

/// Dense row-major grid of cells.
#[derive(Clone, Debug)]
pub struct Board {
    columns: u32,
    rows: u32,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates a board whose cells all rest on bare ground.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![Cell::new(Occupant::Ground); capacity],
        }
    }

    /// Provides the dimensions of the board as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Reports whether `cell` lies on the board.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Cell at the provided coordinate.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<&Cell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    /// Mutable cell at the provided coordinate.
    pub fn cell_mut(&mut self, cell: CellCoord) -> Option<&mut Cell> {
        self.index(cell).and_then(|index| self.cells.get_mut(index))
    }

    /// Reports whether a player may enter `cell`. Cells off the board never are.
    #[must_use]
    pub fn traversable(&self, cell: CellCoord) -> bool {
        self.cell(cell).is_some_and(|cell| cell.top().traversable())
    }

    /// Every coordinate of the board in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |column| CellCoord::new(column, row)))
    }

    /// Visits `origin` and then walks up to `reach` cells outward in each
    /// cardinal direction.
    ///
    /// A direction ends at the board edge, right before a wall, or after the
    /// visitor returns [`Scan::Stop`]. The verdict for `origin` itself does
    /// not affect the four arms.
    pub fn scan_cross<F>(&mut self, origin: CellCoord, reach: u32, mut visit: F)
    where
        F: FnMut(CellCoord, &mut Cell) -> Scan,
    {
        match self.cell_mut(origin) {
            Some(cell) if cell.top() != Occupant::Wall => {
                let _ = visit(origin, cell);
            }
            _ => return,
        }

        for direction in Direction::ALL {
            let mut current = origin;
            for _ in 0..reach {
                let Some(next) = direction.step(current) else {
                    break;
                };
                let Some(cell) = self.cell_mut(next) else {
                    break;
                };
                if cell.top() == Occupant::Wall {
                    break;
                }
                if visit(next, cell) == Scan::Stop {
                    break;
                }
                current = next;
            }
        }
    }

    /// Visits every cell of the square of half-width `radius` centred on `origin`,
    /// clipped to the board.
    pub fn scan_square<F>(&mut self, origin: CellCoord, radius: u32, mut visit: F)
    where
        F: FnMut(CellCoord, &mut Cell),
    {
        let last_column = self.columns.saturating_sub(1);
        let last_row = self.rows.saturating_sub(1);
        let columns = origin.column().saturating_sub(radius)
            ..=origin.column().saturating_add(radius).min(last_column);
        for column in columns {
            let rows = origin.row().saturating_sub(radius)
                ..=origin.row().saturating_add(radius).min(last_row);
            for row in rows {
                let coord = CellCoord::new(column, row);
                if let Some(cell) = self.cell_mut(coord) {
                    visit(coord, cell);
                }
            }
        }
    }

    /// Exports the display name of every cell's topmost occupant.
    #[must_use]
    pub fn export<F>(&self, name_of: F) -> BoardView
    where
        F: Fn(Occupant) -> String,
    {
        let names = self.cells.iter().map(|cell| name_of(cell.top())).collect();
        BoardView::from_names(self.columns, self.rows, names).unwrap_or_default()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomberman_core::PlayerId;

    #[test]
    fn base_layer_survives_pops() {
        let mut cell = Cell::new(Occupant::Ground);
        cell.push(Occupant::Rock);

        assert_eq!(cell.pop(), Some(Occupant::Rock));
        assert_eq!(cell.pop(), None);
        assert_eq!(cell.top(), Occupant::Ground);
        assert_eq!(cell.depth(), 1);
        assert!(!cell.remove(Occupant::Ground), "base is never removable");
    }

    #[test]
    fn remove_reaches_below_the_top() {
        let marker = Occupant::Player(PlayerId::new(0));
        let mut cell = Cell::new(Occupant::Ground);
        cell.push(marker);
        cell.push(Occupant::Bomb);

        assert!(cell.remove(marker));
        assert_eq!(cell.top(), Occupant::Bomb);
        assert!(!cell.contains(marker));
        assert!(!cell.remove(marker));
    }

    #[test]
    fn cross_scan_clips_at_board_edges() {
        let mut board = Board::new(3, 3);
        let mut visited = Vec::new();
        board.scan_cross(CellCoord::new(0, 0), 5, |coord, _| {
            visited.push(coord);
            Scan::Continue
        });

        visited.sort();
        assert_eq!(
            visited,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(0, 1),
                CellCoord::new(0, 2),
                CellCoord::new(1, 0),
                CellCoord::new(2, 0),
            ]
        );
    }

    #[test]
    fn cross_scan_honours_visitor_stop() {
        let mut board = Board::new(7, 1);
        let mut visited = Vec::new();
        board.scan_cross(CellCoord::new(3, 0), 3, |coord, _| {
            visited.push(coord.column());
            if coord.column() == 4 {
                Scan::Stop
            } else {
                Scan::Continue
            }
        });

        assert_eq!(visited, vec![3, 4, 2, 1, 0]);
    }

    #[test]
    fn square_scan_is_clipped() {
        let mut board = Board::new(4, 4);
        let mut count = 0;
        board.scan_square(CellCoord::new(0, 0), 1, |_, _| count += 1);
        assert_eq!(count, 4);
    }

    #[test]
    fn traversable_is_false_off_board() {
        let board = Board::new(2, 2);
        assert!(board.traversable(CellCoord::new(1, 1)));
        assert!(!board.traversable(CellCoord::new(2, 1)));
    }
}
