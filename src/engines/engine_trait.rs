//! Engine abstraction layer used by the match room and the match harness.
//!
//! Defines common input parameters and output payloads so different
//! strategies can be assigned to a side at runtime behind one trait.

use serde::{Deserialize, Serialize};

use crate::game_state::game_state::GameState;
use crate::game_state::game_types::{Movement, Side};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoParams {
    /// Explicit per-decision budget. Wins over `tick_ms`.
    pub movetime_ms: Option<u64>,
    /// Length of the room's round tick; engines derive a budget from it.
    pub tick_ms: Option<u64>,
    /// Cap on searched move distance.
    pub max_distance: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    /// At most one movement per living piece. Pieces left out stay.
    pub movements: Vec<Movement>,
    pub info_lines: Vec<String>,
}

pub trait Engine: Send {
    fn name(&self) -> &str {
        "anonymous"
    }

    fn new_match(&mut self) {}

    fn choose_movements(
        &mut self,
        game_state: &GameState,
        side: Side,
        params: &GoParams,
    ) -> Result<EngineOutput, String>;
}
