//! Default automated opponent: position exploration over a pluggable scorer.

use crate::engines::engine_trait::{Engine, EngineOutput, GoParams};
use crate::engines::time_management::{resolve_go_params, TimeManagementStrategy};
use crate::game_state::game_state::GameState;
use crate::game_state::game_types::Side;
use crate::search::board_scoring::{BoardScorer, FlagRushScorer};
use crate::search::position_exploration::{explore_positions, SearchConfig};

pub struct ExplorerEngine<S: BoardScorer = FlagRushScorer> {
    scorer: S,
    time_strategy: TimeManagementStrategy,
}

impl ExplorerEngine<FlagRushScorer> {
    pub fn new() -> Self {
        Self::with_scorer(FlagRushScorer::default())
    }
}

impl Default for ExplorerEngine<FlagRushScorer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: BoardScorer> ExplorerEngine<S> {
    pub fn with_scorer(scorer: S) -> Self {
        Self {
            scorer,
            time_strategy: TimeManagementStrategy::Adaptive,
        }
    }

    pub fn with_time_strategy(mut self, strategy: TimeManagementStrategy) -> Self {
        self.time_strategy = strategy;
        self
    }
}

impl<S: BoardScorer + 'static> Engine for ExplorerEngine<S> {
    fn name(&self) -> &str {
        "Explorer"
    }

    fn choose_movements(
        &mut self,
        game_state: &GameState,
        side: Side,
        params: &GoParams,
    ) -> Result<EngineOutput, String> {
        let resolved = resolve_go_params(game_state, params, self.time_strategy);
        let result = explore_positions(
            game_state,
            side,
            &self.scorer,
            SearchConfig {
                max_distance: resolved.max_distance,
                movetime_ms: resolved.movetime_ms,
            },
        );

        let mut info_lines = vec![format!(
            "info string explorer side {:?} delta {} baseline {} simulations {} time {}ms",
            side, result.total_delta, result.baseline_score, result.simulations, result.elapsed_ms
        )];
        if result.timed_out {
            info_lines.push("info string explorer timed out, holding position".to_owned());
        }
        if result.stacking_unavoidable {
            info_lines.push("info string explorer could not avoid stacking".to_owned());
        }

        Ok(EngineOutput {
            movements: result.movements,
            info_lines,
        })
    }
}
