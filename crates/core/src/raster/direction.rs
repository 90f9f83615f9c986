//! D4 flow directions
//!
//! Cardinal-only (rook) adjacency: each masked cell drains into exactly one
//! of its four axis-aligned neighbors. Codes follow the raster convention
//! 1 = North, 2 = East, 3 = South, 4 = West; 0 is reserved for cells outside
//! the watershed mask.

/// A D4 flow direction.
///
/// Offsets are in (row, col) space with row 0 at the top, so North is
/// row - 1 and South is row + 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    North = 1,
    East = 2,
    South = 3,
    West = 4,
}

impl Direction {
    /// All four directions in code order (N, E, S, W)
    pub const CARDINAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Decode a raster direction code. Codes outside 1-4 are not directions.
    pub fn from_code(code: u8) -> Option<Direction> {
        match code {
            1 => Some(Direction::North),
            2 => Some(Direction::East),
            3 => Some(Direction::South),
            4 => Some(Direction::West),
            _ => None,
        }
    }

    /// Raster code for this direction (1-4)
    pub fn code(self) -> u8 {
        self as u8
    }

    /// (row, col) offset of the neighbor this direction points at
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }

    /// The direction pointing back at this one
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Zero-based index (N=0, E=1, S=2, W=3), for per-direction layer stacks
    pub fn index(self) -> usize {
        self as usize - 1
    }
}
