use std::fmt;

use serde::{Deserialize, Serialize};

/// Side length of the square game board.
pub const GRID_SIZE: i32 = 10;

/// A cell on the board, addressed as (row, column).
///
/// Serialized as a two-element JSON array `[row, col]`, matching the game
/// server's state messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Component-wise difference `self - origin`.
    pub fn offset_from(self, origin: Position) -> Offset {
        Offset {
            drow: self.row - origin.row,
            dcol: self.col - origin.col,
        }
    }

    /// Whether the position lies on the board.
    pub fn in_bounds(self) -> bool {
        (0..GRID_SIZE).contains(&self.row) && (0..GRID_SIZE).contains(&self.col)
    }

    /// Whether a single step in `dir` would leave the board.
    pub fn at_edge(self, dir: Direction) -> bool {
        match dir {
            Direction::Up => self.row == 0,
            Direction::Down => self.row == GRID_SIZE - 1,
            Direction::Left => self.col == 0,
            Direction::Right => self.col == GRID_SIZE - 1,
        }
    }
}

impl From<[i32; 2]> for Position {
    fn from([row, col]: [i32; 2]) -> Self {
        Self { row, col }
    }
}

impl From<Position> for [i32; 2] {
    fn from(p: Position) -> Self {
        [p.row, p.col]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Relative displacement between two cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    pub drow: i32,
    pub dcol: i32,
}

impl Offset {
    pub const fn new(drow: i32, dcol: i32) -> Self {
        Self { drow, dcol }
    }

    /// One unit step along a single axis. Diagonals and the zero offset
    /// are not adjacent.
    pub fn is_adjacent(self) -> bool {
        (self.drow + self.dcol).abs() == 1 && (self.drow == 0 || self.dcol == 0)
    }
}

/// A move on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Static bijection between directions and their unit offsets.
const OFFSET_TABLE: [(Direction, Offset); 4] = [
    (Direction::Up, Offset::new(-1, 0)),
    (Direction::Down, Offset::new(1, 0)),
    (Direction::Left, Offset::new(0, -1)),
    (Direction::Right, Offset::new(0, 1)),
];

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn offset(self) -> Offset {
        OFFSET_TABLE[self as usize].1
    }

    /// Reverse lookup in the offset table. `None` for anything that is not
    /// one of the four unit vectors.
    pub fn from_offset(offset: Offset) -> Option<Direction> {
        OFFSET_TABLE
            .iter()
            .find(|(_, o)| *o == offset)
            .map(|(d, _)| *d)
    }

    /// Wire name sent as the move payload.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
