//! Pluggable position evaluation.
//!
//! Search stays independent of the heuristic by going through
//! `BoardScorer`. The baseline `FlagRushScorer` is a sum of linear terms,
//! each computed for both sides and taken as "mine minus theirs".

use serde::{Deserialize, Serialize};

use crate::game_state::game_state::GameState;
use crate::game_state::game_types::Side;

pub const WIN_SCORE: i32 = 10_000;

pub trait BoardScorer: Send + Sync {
    /// Score from `side`'s perspective. `prior` is the state before the
    /// round that produced `state`; without it capture terms are zero.
    fn score(&self, state: &GameState, side: Side, prior: Option<&GameState>) -> i32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub flag_possession: i32,
    pub on_enemy_flag: i32,
    pub in_enemy_zone: i32,
    pub on_enemy_back_rank: i32,
    pub piece_advantage: i32,
    pub net_capture: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            flag_possession: 8000,
            on_enemy_flag: 3000,
            in_enemy_zone: 1000,
            on_enemy_back_rank: 500,
            piece_advantage: 200,
            net_capture: 1000,
        }
    }
}

/// Itemized evaluation, for debugging and telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Set when the match is over; every other term is then zero.
    pub terminal: Option<i32>,
    pub flag_possession: i32,
    pub on_enemy_flag: i32,
    pub in_enemy_zone: i32,
    pub on_enemy_back_rank: i32,
    pub piece_advantage: i32,
    pub net_captures: i32,
    pub total: i32,
}

#[derive(Debug, Clone, Copy, Default)]
struct SideFeatures {
    carrying: i32,
    on_enemy_flag: i32,
    in_enemy_zone: i32,
    on_enemy_back_rank: i32,
    alive: i32,
    lost_this_round: i32,
}

fn side_features(state: &GameState, side: Side, prior: Option<&GameState>) -> SideFeatures {
    let config = &state.config;
    let enemy = side.opposite();
    let enemy_flag = state.flags[enemy.index()];
    let enemy_zone_active = state.zones_active[enemy.index()];

    let mut features = SideFeatures {
        carrying: i32::from(enemy_flag.carried_by.is_some_and(|c| c.side == side)),
        ..SideFeatures::default()
    };

    for piece in state.living_pieces(side) {
        let cell = piece.cell();
        features.alive += 1;
        if !enemy_flag.is_carried() && cell == enemy_flag.cell() {
            features.on_enemy_flag += 1;
        }
        if enemy_zone_active && config.in_no_guard_zone(enemy, cell) {
            features.in_enemy_zone += 1;
        }
        if config.is_back_rank(enemy, cell) {
            features.on_enemy_back_rank += 1;
        }
    }

    if let Some(prior) = prior {
        features.lost_this_round = state
            .side(side)
            .pieces
            .iter()
            .filter(|p| !p.alive)
            .filter(|p| prior.piece(side, p.id).is_some_and(|before| before.alive))
            .count() as i32;
    }
    features
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlagRushScorer {
    pub weights: ScoreWeights,
}

impl FlagRushScorer {
    pub const fn with_weights(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn breakdown(&self, state: &GameState, side: Side, prior: Option<&GameState>) -> ScoreBreakdown {
        if state.is_finished() {
            let terminal = match state.winner {
                Some(winner) if winner == side => WIN_SCORE,
                Some(_) => -WIN_SCORE,
                None => 0,
            };
            return ScoreBreakdown {
                terminal: Some(terminal),
                total: terminal,
                ..ScoreBreakdown::default()
            };
        }

        let w = self.weights;
        let mine = side_features(state, side, prior);
        let theirs = side_features(state, side.opposite(), prior);

        let mut b = ScoreBreakdown {
            terminal: None,
            flag_possession: w.flag_possession * (mine.carrying - theirs.carrying),
            on_enemy_flag: w.on_enemy_flag * (mine.on_enemy_flag - theirs.on_enemy_flag),
            in_enemy_zone: w.in_enemy_zone * (mine.in_enemy_zone - theirs.in_enemy_zone),
            on_enemy_back_rank: w.on_enemy_back_rank
                * (mine.on_enemy_back_rank - theirs.on_enemy_back_rank),
            piece_advantage: w.piece_advantage * (mine.alive - theirs.alive),
            net_captures: w.net_capture * (theirs.lost_this_round - mine.lost_this_round),
            total: 0,
        };
        b.total = b.flag_possession
            + b.on_enemy_flag
            + b.in_enemy_zone
            + b.on_enemy_back_rank
            + b.piece_advantage
            + b.net_captures;
        b
    }
}

impl BoardScorer for FlagRushScorer {
    fn score(&self, state: &GameState, side: Side, prior: Option<&GameState>) -> i32 {
        self.breakdown(state, side, prior).total
    }
}

/// Only counts living pieces; used to sanity-check the search plumbing.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialScorer;

impl BoardScorer for MaterialScorer {
    fn score(&self, state: &GameState, side: Side, _prior: Option<&GameState>) -> i32 {
        state.alive_count(side) as i32 - state.alive_count(side.opposite()) as i32
    }
}
