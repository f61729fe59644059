//! Errors used throughout the flag_rush engine.
//!
//! Two families exist and they are deliberately kept apart:
//! - `ConfigError` covers impossible board geometry. It is raised while a
//!   match is being set up and never once rounds are running.
//! - `EngineError` covers internal invariant faults found while simulating a
//!   round. Callers in the search degrade the affected piece to a stay.
//!
//! Untrusted client input (unknown pieces, bad directions, negative
//! distances) is never an error: it is dropped and treated as a stay.

use thiserror::Error;

use crate::game_state::game_types::{Cell, Side};

/// Startup geometry failure. Returned before any round executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Width or height is zero, or too large for the cell coordinate type.
    #[error("board dimensions {width}x{height} are not playable")]
    InvalidDimensions { width: i32, height: i32 },

    /// A home band is thinner than `MIN_HOME_ROWS` or the two bands overlap.
    #[error(
        "home bands of {home_rows} rows do not fit a board of height {height} (need {min} to {height}/2 rows)",
        min = crate::game_state::board_config::MIN_HOME_ROWS
    )]
    OverlappingHomeBands { home_rows: i32, height: i32 },

    /// A side was configured with no pieces or more pieces than spawn cells.
    #[error("{side:?} has an unusable piece count of {count}")]
    InvalidPieceCount { side: Side, count: usize },

    /// A fixed coordinate lies outside the board.
    #[error("{what} for {side:?} at {cell} is off the board")]
    OffBoard {
        what: &'static str,
        side: Side,
        cell: Cell,
    },

    /// A fixed coordinate lies in the wrong territory.
    #[error("{what} for {side:?} at {cell} is outside its required territory")]
    WrongTerritory {
        what: &'static str,
        side: Side,
        cell: Cell,
    },

    /// The no-guard zone does not contain its flag or leaves the home band.
    #[error("no-guard zone for {side:?} is malformed")]
    MalformedZone { side: Side },

    /// A piece would spawn inside its own no-guard zone and be unable to leave.
    #[error("spawn for {side:?} at {cell} lies inside its own no-guard zone")]
    SpawnInsideZone { side: Side, cell: Cell },

    /// Two pieces of one side share a spawn cell.
    #[error("duplicate spawn for {side:?} at {cell}")]
    DuplicateSpawn { side: Side, cell: Cell },

    /// A board description could not be parsed.
    #[error("could not parse board config: {0}")]
    Parse(String),
}

/// Internal simulation fault. Indicates invariant drift, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A path record or event referenced a piece missing from its roster.
    #[error("{side:?} has no piece with id {piece_id}")]
    UnknownPiece { side: Side, piece_id: u8 },

    /// Path records disagreed on the round length.
    #[error("path for {side:?} piece {piece_id} has {len} steps, expected {expected}")]
    RaggedPaths {
        side: Side,
        piece_id: u8,
        len: usize,
        expected: usize,
    },

    /// Exported state could not be serialized.
    #[error("state export failed: {0}")]
    Export(String),
}
