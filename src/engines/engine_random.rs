//! Random and idle engines.
//!
//! `RandomEngine` picks a uniform direction and distance for every living
//! piece and is used for diagnostics, harness smoke tests and as a weak
//! sparring partner. `IdleEngine` never moves.

use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engines::engine_trait::{Engine, EngineOutput, GoParams};
use crate::game_state::game_state::GameState;
use crate::game_state::game_types::{Direction, Movement, Side};

pub struct RandomEngine {
    seed: u64,
    rng: StdRng,
}

impl RandomEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Engine for RandomEngine {
    fn name(&self) -> &str {
        "Random"
    }

    fn new_match(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    fn choose_movements(
        &mut self,
        game_state: &GameState,
        side: Side,
        params: &GoParams,
    ) -> Result<EngineOutput, String> {
        let reach = params
            .max_distance
            .unwrap_or_else(|| u8::try_from(game_state.config.max_dimension()).unwrap_or(u8::MAX));

        let mut out = EngineOutput::default();
        for piece in game_state.living_pieces(side) {
            let direction = *Direction::ALL
                .choose(&mut self.rng)
                .ok_or("failed to choose a random direction")?;
            let distance = self.rng.random_range(0..=reach);
            out.movements.push(Movement::new(piece.id, direction, distance));
        }
        out.info_lines.push(format!(
            "info string random_engine pieces {}",
            out.movements.len()
        ));
        Ok(out)
    }
}

/// Leaves every piece where it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleEngine;

impl Engine for IdleEngine {
    fn name(&self) -> &str {
        "Idle"
    }

    fn choose_movements(
        &mut self,
        game_state: &GameState,
        side: Side,
        _params: &GoParams,
    ) -> Result<EngineOutput, String> {
        Ok(EngineOutput {
            movements: game_state
                .living_pieces(side)
                .map(|p| Movement::stay(p.id))
                .collect(),
            info_lines: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::board_config::BoardConfig;

    fn playing() -> GameState {
        GameState::new_playing(BoardConfig::standard()).expect("standard board")
    }

    #[test]
    fn random_engine_is_reproducible_per_seed() {
        let state = playing();
        let params = GoParams::default();
        let mut a = RandomEngine::new(9);
        let mut b = RandomEngine::new(9);
        let first = a.choose_movements(&state, Side::North, &params).expect("answer");
        let second = b.choose_movements(&state, Side::North, &params).expect("answer");
        assert_eq!(first.movements, second.movements);

        a.new_match();
        let replay = a.choose_movements(&state, Side::North, &params).expect("answer");
        assert_eq!(replay.movements, first.movements);
    }

    #[test]
    fn random_engine_respects_distance_cap_and_roster() {
        let mut state = playing();
        state.jail_piece(Side::South, 1).expect("piece exists");
        let mut engine = RandomEngine::new(3);
        let params = GoParams {
            max_distance: Some(2),
            ..GoParams::default()
        };
        for _ in 0..20 {
            let out = engine.choose_movements(&state, Side::South, &params).expect("answer");
            let ids: Vec<u8> = out.movements.iter().map(|m| m.piece_id).collect();
            assert_eq!(ids, vec![0, 2]);
            assert!(out.movements.iter().all(|m| m.distance <= 2));
        }
    }

    #[test]
    fn idle_engine_always_stays() {
        let out = IdleEngine
            .choose_movements(&playing(), Side::North, &GoParams::default())
            .expect("answer");
        assert_eq!(out.movements.len(), 3);
        assert!(out.movements.iter().all(Movement::is_stay));
    }
}
