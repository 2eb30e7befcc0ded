use super::piece::{Piece, PieceKind};

pub const COLUMNS: usize = 10;
pub const ROWS: usize = 20;

type Row = [Option<PieceKind>; COLUMNS];

fn is_full(row: &Row) -> bool {
    row.iter().all(Option::is_some)
}

/// The playfield. Row 0 is the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: Vec<Row>,
}

impl Default for Board {
    fn default() -> Self {
        Board {
            rows: vec![[None; COLUMNS]; ROWS],
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of a cell; anything off the grid reads as empty
    pub fn cell(&self, x: i32, y: i32) -> Option<PieceKind> {
        if x < 0 || y < 0 {
            return None;
        }
        self.rows
            .get(y as usize)
            .and_then(|row| row.get(x as usize).copied().flatten())
    }

    /// Fill a single cell. Out-of-grid coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, kind: Option<PieceKind>) {
        if let Some(cell) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = kind;
        }
    }

    /// True if any cell of `piece` is off the sides or bottom, or lands on a
    /// filled cell. Cells above the top row never collide.
    pub fn collides(&self, piece: &Piece) -> bool {
        piece.cells().any(|(x, y)| {
            if x < 0 || x >= COLUMNS as i32 || y >= ROWS as i32 {
                return true;
            }
            y >= 0 && self.cell(x, y).is_some()
        })
    }

    /// Copy the piece's visible cells onto the board
    pub fn merge(&mut self, piece: &Piece) {
        for (x, y) in piece.cells() {
            if x >= 0 && y >= 0 {
                self.set(x as usize, y as usize, Some(piece.kind));
            }
        }
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows.get(y).is_some_and(is_full)
    }

    /// Remove full rows, drop everything above them, and return how many
    /// rows went.
    pub fn clear_full_rows(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| !is_full(row));
        let cleared = before - self.rows.len();

        let mut refilled = vec![[None; COLUMNS]; cleared];
        refilled.append(&mut self.rows);
        self.rows = refilled;

        cleared
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(Option::is_none)
    }
}
