//! Capture notification.
//!
//! The collision resolver announces every jailing through `CaptureListener`
//! without knowing who listens. The flag manager is always subscribed
//! first; match hosts may add their own listeners (statistics, replays).

use serde::{Deserialize, Serialize};

use crate::game_state::game_state::GameState;
use crate::game_state::game_types::{Cell, Side};

/// One jailing, as recorded in the round report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub round: u32,
    pub side: Side,
    pub piece_id: u8,
    pub cell: Cell,
}

pub trait CaptureListener {
    /// Called once per jailing, after the piece is marked dead and before
    /// any flag interaction runs for the round.
    fn on_capture(&mut self, state: &mut GameState, side: Side, piece_id: u8);
}

/// Counts jailings per side over a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTally {
    /// `jailed[s]` is how many times side `s` lost a piece.
    pub jailed: [u32; 2],
}

impl CaptureTally {
    #[inline]
    pub fn total(&self) -> u32 {
        self.jailed[0] + self.jailed[1]
    }
}

impl CaptureListener for CaptureTally {
    fn on_capture(&mut self, _state: &mut GameState, side: Side, _piece_id: u8) {
        self.jailed[side.index()] = self.jailed[side.index()].saturating_add(1);
    }
}
