//! Small value types shared by the round pipeline and the search.
//!
//! Coordinates use `x` for the column and `y` for the row, with `y` growing
//! downward: `Direction::Up` decreases `y`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two symmetric competitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Owns the rows at the top of the board (low `y`).
    North,
    /// Owns the rows at the bottom of the board (high `y`).
    South,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::North, Side::South];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Side::North => 0,
            Side::South => 1,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::North => Side::South,
            Side::South => Side::North,
        }
    }
}

/// Board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Search and tie-break order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    #[inline]
    pub const fn order(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// Parse a client-supplied direction name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// A validated per-piece command. `distance == 0` is a stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Movement {
    pub piece_id: u8,
    pub direction: Direction,
    pub distance: u8,
}

impl Movement {
    #[inline]
    pub const fn new(piece_id: u8, direction: Direction, distance: u8) -> Self {
        Self {
            piece_id,
            direction,
            distance,
        }
    }

    #[inline]
    pub const fn stay(piece_id: u8) -> Self {
        Self::new(piece_id, Direction::Up, 0)
    }

    #[inline]
    pub const fn is_stay(&self) -> bool {
        self.distance == 0
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_stay() {
            write!(f, "#{} stay", self.piece_id)
        } else {
            write!(
                f,
                "#{} {} {}",
                self.piece_id,
                self.direction.name(),
                self.distance
            )
        }
    }
}

/// Untrusted command as it arrives from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommand {
    pub piece_id: i64,
    pub direction: String,
    pub distance: i64,
}

impl RawCommand {
    /// Convert to a `Movement`, or `None` when any field is unusable.
    ///
    /// Distances beyond `u8::MAX` are clamped; path resolution stops at the
    /// board edge anyway.
    pub fn to_movement(&self) -> Option<Movement> {
        let piece_id = u8::try_from(self.piece_id).ok()?;
        let direction = Direction::from_name(&self.direction)?;
        if self.distance < 0 {
            return None;
        }
        let distance = u8::try_from(self.distance).unwrap_or(u8::MAX);
        Some(Movement::new(piece_id, direction, distance))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Waiting,
    Paused,
    Playing,
    Finished,
}

/// Per-side command lists for one round, indexed by `Side::index`.
pub type SideCommands = [Vec<Movement>; 2];
