//! Reusable time-management strategies for per-round decision budgets.
//!
//! The room passes its raw tick length; the engine decides how much of it to
//! spend on search.

use crate::engines::engine_trait::GoParams;
use crate::game_state::game_state::GameState;

/// Never plan to use the last few milliseconds of a tick.
pub const TICK_RESERVE_MS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeManagementStrategy {
    /// Spend half of the tick.
    HalfTick,
    /// Spend more of the tick while the match is still balanced and less
    /// once one side has lost pieces, where search rarely changes the answer.
    Adaptive,
}

pub fn resolve_go_params(
    game_state: &GameState,
    params: &GoParams,
    strategy: TimeManagementStrategy,
) -> GoParams {
    if params.movetime_ms.is_some() {
        return params.clone();
    }

    let mut resolved = params.clone();
    if let Some(tick) = params.tick_ms {
        let usable = tick.saturating_sub(TICK_RESERVE_MS);
        resolved.movetime_ms = Some(match strategy {
            TimeManagementStrategy::HalfTick => (usable / 2).max(1),
            TimeManagementStrategy::Adaptive => adaptive_budget_ms(game_state, usable),
        });
    }
    resolved
}

fn adaptive_budget_ms(game_state: &GameState, usable_ms: u64) -> u64 {
    let total: usize = game_state.sides.iter().map(|s| s.pieces.len()).sum();
    let jailed: usize = game_state
        .sides
        .iter()
        .map(|s| s.jailed_piece_ids.len())
        .sum();

    let share = if jailed == 0 {
        3
    } else if jailed * 2 < total {
        2
    } else {
        1
    };
    (usable_ms * share / 4).max(1)
}
