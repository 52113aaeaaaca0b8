use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a player, `0..num_players`.
pub type PlayerId = usize;

/// Largest player count a board can store.
pub const MAX_PLAYERS: usize = u8::MAX as usize;

/// A board coordinate, either requested by a player or applied to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub row: usize,
    pub col: usize,
}

impl Move {
    /// A move at `row`, `col`; row 0 is the top of the board.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Row-major encoding used by search frontiers.
    pub const fn encode(self, width: usize) -> usize {
        self.row * width + self.col
    }

    /// Inverse of [`Move::encode`].
    pub const fn decode(code: usize, width: usize) -> Self {
        Self {
            row: code / width,
            col: code % width,
        }
    }
}

/// The rectangular grid of cells. Each cell is empty or holds a player index.
///
/// Serializes as a list of rows, each a list of `null` or a player index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<Option<u8>>>", try_from = "Vec<Vec<Option<u8>>>")]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Option<u8>>,
}

impl Board {
    /// An empty `width` by `height` board.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether `m` lies on the board.
    pub fn contains(&self, m: Move) -> bool {
        m.row < self.height && m.col < self.width
    }

    /// The cell `steps` times `(dr, dc)` away from `m`, if it is on the board.
    pub fn step(&self, m: Move, dr: isize, dc: isize, steps: usize) -> Option<Move> {
        let steps = isize::try_from(steps).ok()?;
        let row = m.row.checked_add_signed(dr.checked_mul(steps)?)?;
        let col = m.col.checked_add_signed(dc.checked_mul(steps)?)?;
        let target = Move::new(row, col);
        self.contains(target).then_some(target)
    }

    /// Owner of the cell; `None` for empty or off-board cells.
    pub fn get(&self, m: Move) -> Option<PlayerId> {
        if !self.contains(m) {
            return None;
        }
        self.cells[m.encode(self.width)].map(PlayerId::from)
    }

    /// Whether `m` is on the board and unoccupied.
    pub fn is_empty_at(&self, m: Move) -> bool {
        self.contains(m) && self.cells[m.encode(self.width)].is_none()
    }

    /// Writes a cell. Off-board writes are ignored.
    pub fn set(&mut self, m: Move, value: Option<PlayerId>) {
        if self.contains(m) {
            let idx = m.encode(self.width);
            self.cells[idx] = value.and_then(|p| u8::try_from(p).ok());
        }
    }

    /// Whether no empty cell is left.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Number of occupied cells.
    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Occupied cells with their owners, row-major.
    pub fn stones(&self) -> impl Iterator<Item = (Move, PlayerId)> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, c)| {
            c.map(|p| (Move::decode(i, self.width), PlayerId::from(p)))
        })
    }

    /// Lowest empty row of a column.
    pub fn lowest_empty(&self, col: usize) -> Option<Move> {
        (0..self.height)
            .rev()
            .map(|row| Move::new(row, col))
            .find(|&m| self.is_empty_at(m))
    }

    /// The grid as rows of owners, top row first.
    pub fn to_rows(&self) -> Vec<Vec<Option<PlayerId>>> {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|c| c.map(PlayerId::from)).collect())
            .collect()
    }

    pub(crate) fn raw_cells(&self) -> &[Option<u8>] {
        &self.cells
    }
}

impl From<Board> for Vec<Vec<Option<u8>>> {
    fn from(board: Board) -> Self {
        board
            .cells
            .chunks(board.width.max(1))
            .map(<[Option<u8>]>::to_vec)
            .collect()
    }
}

impl TryFrom<Vec<Vec<Option<u8>>>> for Board {
    type Error = String;

    fn try_from(rows: Vec<Vec<Option<u8>>>) -> Result<Self, Self::Error> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != width) {
            return Err(format!(
                "row {bad} has {} cells, expected {width}",
                rows[bad].len()
            ));
        }
        Ok(Self {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width.max(1)) {
            for cell in row {
                match cell {
                    None => write!(f, " .")?,
                    Some(p) if *p < 10 => write!(f, " {p}")?,
                    Some(p) => write!(f, " {}", char::from(b'a' + (p - 10) % 26))?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
