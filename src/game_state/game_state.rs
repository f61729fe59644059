//! Match state aggregate.
//!
//! `GameState` is the single mutable snapshot the round pipeline operates
//! on. It is cheap to clone (the board geometry is shared behind an `Arc`),
//! which is what the search relies on when it simulates rounds on copies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, EngineError};
use crate::game_state::board_config::BoardConfig;
use crate::game_state::game_types::{Cell, MatchStatus, Side};
use crate::round::flags::initial_flags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: u8,
    pub x: i32,
    pub y: i32,
    pub alive: bool,
}

impl Piece {
    #[inline]
    pub const fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }

    #[inline]
    pub fn set_cell(&mut self, cell: Cell) {
        self.x = cell.x;
        self.y = cell.y;
    }
}

/// Roster and jail list of one side. Pieces are never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideState {
    pub pieces: Vec<Piece>,
    pub jailed_piece_ids: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagCarrier {
    pub side: Side,
    pub piece_id: u8,
}

/// When `carried_by` is set, `(x, y)` equals the carrier's cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub x: i32,
    pub y: i32,
    pub carried_by: Option<FlagCarrier>,
}

impl Flag {
    #[inline]
    pub const fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }

    #[inline]
    pub const fn is_carried(&self) -> bool {
        self.carried_by.is_some()
    }
}

/// Present iff the owning side has at least one jailed piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescueKey {
    pub x: i32,
    pub y: i32,
    pub present: bool,
}

impl RescueKey {
    #[inline]
    pub const fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

/// A rescuer waiting to be sent back to its spawn at the next round start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReset {
    pub side: Side,
    pub piece_id: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub config: Arc<BoardConfig>,
    pub round: u32,
    /// Indexed by `Side::index`, as are the other per-side arrays.
    pub sides: [SideState; 2],
    /// `flags[s]` belongs to side `s`.
    pub flags: [Flag; 2],
    /// `keys[s]` frees side `s`.
    pub keys: [RescueKey; 2],
    pub zones_active: [bool; 2],
    pub status: MatchStatus,
    pub winner: Option<Side>,
    pub pending_resets: Vec<PendingReset>,
}

impl GameState {
    /// Fresh match in `Waiting`, pieces on their spawns.
    pub fn new(config: BoardConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let roster = |side: Side| SideState {
            pieces: config.spawns[side.index()]
                .iter()
                .enumerate()
                .map(|(i, cell)| Piece {
                    id: i as u8,
                    x: cell.x,
                    y: cell.y,
                    alive: true,
                })
                .collect(),
            jailed_piece_ids: Vec::new(),
        };
        let key = |side: Side| {
            let cell = config.key_positions[side.index()];
            RescueKey {
                x: cell.x,
                y: cell.y,
                present: false,
            }
        };

        Ok(Self {
            sides: [roster(Side::North), roster(Side::South)],
            flags: initial_flags(&config),
            keys: [key(Side::North), key(Side::South)],
            zones_active: [true, true],
            round: 0,
            status: MatchStatus::Waiting,
            winner: None,
            pending_resets: Vec::new(),
            config: Arc::new(config),
        })
    }

    /// Fresh match already in `Playing`.
    pub fn new_playing(config: BoardConfig) -> Result<Self, ConfigError> {
        let mut state = Self::new(config)?;
        state.status = MatchStatus::Playing;
        Ok(state)
    }

    #[inline]
    pub fn side(&self, side: Side) -> &SideState {
        &self.sides[side.index()]
    }

    #[inline]
    pub fn piece(&self, side: Side, piece_id: u8) -> Option<&Piece> {
        self.sides[side.index()]
            .pieces
            .iter()
            .find(|p| p.id == piece_id)
    }

    #[inline]
    pub fn piece_mut(&mut self, side: Side, piece_id: u8) -> Option<&mut Piece> {
        self.sides[side.index()]
            .pieces
            .iter_mut()
            .find(|p| p.id == piece_id)
    }

    pub fn living_pieces(&self, side: Side) -> impl Iterator<Item = &Piece> + '_ {
        self.sides[side.index()].pieces.iter().filter(|p| p.alive)
    }

    #[inline]
    pub fn alive_count(&self, side: Side) -> usize {
        self.living_pieces(side).count()
    }

    /// Move a piece; used by setup code and rescue relocation.
    pub fn place_piece(&mut self, side: Side, piece_id: u8, cell: Cell) -> Result<(), EngineError> {
        let piece = self
            .piece_mut(side, piece_id)
            .ok_or(EngineError::UnknownPiece { side, piece_id })?;
        piece.set_cell(cell);
        Ok(())
    }

    /// Jail a piece. Returns `true` only when the piece was alive before.
    ///
    /// The jail list never receives the same id twice.
    pub fn jail_piece(&mut self, side: Side, piece_id: u8) -> Result<bool, EngineError> {
        let piece = self
            .piece_mut(side, piece_id)
            .ok_or(EngineError::UnknownPiece { side, piece_id })?;
        let was_alive = piece.alive;
        piece.alive = false;

        let jailed = &mut self.sides[side.index()].jailed_piece_ids;
        if !jailed.contains(&piece_id) {
            jailed.push(piece_id);
        }
        Ok(was_alive)
    }

    /// Which flag, if any, the given piece is carrying.
    pub fn flag_carried_by(&self, side: Side, piece_id: u8) -> Option<Side> {
        Side::ALL.into_iter().find(|&flag_side| {
            self.flags[flag_side.index()].carried_by == Some(FlagCarrier { side, piece_id })
        })
    }

    #[inline]
    pub fn is_carrying_opposing_flag(&self, side: Side, piece_id: u8) -> bool {
        self.flags[side.opposite().index()].carried_by == Some(FlagCarrier { side, piece_id })
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    /// Serialized snapshot for the transport layer.
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string(self).map_err(|e| EngineError::Export(e.to_string()))
    }
}
