//! Rescue keys.
//!
//! Each side has one key on a fixed cell in the opposing territory. The key
//! exists only while that side has jailed pieces. A living teammate landing
//! on it frees every jailed piece at once; freed pieces go straight back to
//! their spawns, while the rescuer holds the key cell until the next round
//! starts.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::EngineError;
use crate::game_state::game_state::{GameState, PendingReset};
use crate::game_state::game_types::Side;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescueEvent {
    pub round: u32,
    pub side: Side,
    pub rescuer_id: u8,
    pub released: Vec<u8>,
}

/// Key present iff the side has at least one jailed piece.
pub fn sync_key_presence(state: &mut GameState) {
    for side in Side::ALL {
        state.keys[side.index()].present = !state.sides[side.index()].jailed_piece_ids.is_empty();
    }
}

/// Send last round's rescuers back to their spawns. Consumed once.
pub fn apply_pending_resets(state: &mut GameState) -> Result<(), EngineError> {
    let pending = std::mem::take(&mut state.pending_resets);
    for reset in pending {
        let spawn = state
            .config
            .spawn(reset.side, reset.piece_id)
            .ok_or(EngineError::UnknownPiece {
                side: reset.side,
                piece_id: reset.piece_id,
            })?;
        state.place_piece(reset.side, reset.piece_id, spawn)?;
    }
    Ok(())
}

/// Release jailed pieces for every side whose key is stood on.
///
/// Flag carriers are not eligible rescuers, so the deferred reset can never
/// carry a flag home.
pub fn run_rescue_pass(state: &mut GameState) -> Result<Vec<RescueEvent>, EngineError> {
    sync_key_presence(state);
    let mut events = Vec::new();

    for side in Side::ALL {
        let key = state.keys[side.index()];
        if !key.present {
            continue;
        }
        let rescuer = state
            .living_pieces(side)
            .filter(|p| p.cell() == key.cell())
            .map(|p| p.id)
            // A carrier reset to its spawn next round would walk the flag
            // home without crossing the board.
            .filter(|&id| state.flag_carried_by(side, id).is_none())
            .min();
        let Some(rescuer_id) = rescuer else {
            continue;
        };

        let released = std::mem::take(&mut state.sides[side.index()].jailed_piece_ids);
        for &piece_id in &released {
            let spawn = state
                .config
                .spawn(side, piece_id)
                .ok_or(EngineError::UnknownPiece { side, piece_id })?;
            let piece = state
                .piece_mut(side, piece_id)
                .ok_or(EngineError::UnknownPiece { side, piece_id })?;
            piece.alive = true;
            piece.set_cell(spawn);
        }
        state.pending_resets.push(PendingReset {
            side,
            piece_id: rescuer_id,
        });
        info!(
            round = state.round,
            ?side,
            rescuer_id,
            released = released.len(),
            "jailed pieces rescued"
        );
        events.push(RescueEvent {
            round: state.round,
            side,
            rescuer_id,
            released,
        });
    }

    sync_key_presence(state);
    Ok(events)
}
