//! Position exploration: the move search behind the automated opponent.
//!
//! The search runs in three stages, all on cloned state:
//! 1. predict one reply per opposing piece, each searched with everybody
//!    else standing still;
//! 2. for every own piece and direction, find the best distance by
//!    simulating the candidate together with the whole predicted reply;
//! 3. cross the per-piece candidates, drop combinations that stack two own
//!    pieces on one cell, and keep the best summed delta.
//!
//! Deltas are always taken against one baseline: own side standing still
//! against the predicted reply. Captures that happen regardless of our move
//! therefore cancel out instead of being credited to a candidate.
//!
//! The reply prediction is a stand-still approximation, not a best response
//! to our eventual move.
//!
//! Ties are broken by the candidate key `(distance, direction)` with a stay
//! as the smallest key: shorter moves win, then up < down < left < right,
//! and combinations compare piece by piece in roster order.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::EngineError;
use crate::game_state::game_state::{GameState, Piece};
use crate::game_state::game_types::{Cell, Direction, Movement, Side, SideCommands};
use crate::round::movement_paths::free_run;
use crate::round::rescue_keys::apply_pending_resets;
use crate::round::round_executor::simulate_round;
use crate::search::board_scoring::BoardScorer;

/// Above this many combinations assembly falls back to a greedy pass.
pub const MAX_COMBINATIONS: u64 = 1 << 18;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Longest distance tried; defaults to the larger board dimension.
    pub max_distance: Option<u8>,
    /// Wall-clock budget. When exceeded the search returns all stays.
    pub movetime_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub movement: Movement,
    pub delta: i32,
    pub destination: Cell,
}

impl Candidate {
    /// Tie-break key: stays first, then shorter moves, then direction order.
    #[inline]
    pub fn key(&self) -> (u8, u8) {
        key_of(&self.movement)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceCandidates {
    pub piece_id: u8,
    /// Stay first, then the best move of each profitable direction, sorted
    /// by `Candidate::key`.
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationResult {
    /// One movement per living own piece, roster order.
    pub movements: Vec<Movement>,
    pub total_delta: i32,
    pub baseline_score: i32,
    pub predicted_reply: Vec<Movement>,
    pub per_piece: Vec<PieceCandidates>,
    pub simulations: u64,
    pub elapsed_ms: u64,
    pub timed_out: bool,
    /// Every combination stacked two pieces; the best stacking one was used.
    pub stacking_unavoidable: bool,
}

#[derive(Debug)]
enum Abort {
    TimedOut,
    Fault(EngineError),
}

impl From<EngineError> for Abort {
    fn from(e: EngineError) -> Self {
        Abort::Fault(e)
    }
}

struct Explorer<'a, S: BoardScorer> {
    state: &'a GameState,
    scorer: &'a S,
    max_distance: u8,
    deadline: Option<Instant>,
    simulations: u64,
}

impl<S: BoardScorer> Explorer<'_, S> {
    fn check_clock(&self) -> Result<(), Abort> {
        match self.deadline {
            Some(limit) if Instant::now() >= limit => Err(Abort::TimedOut),
            _ => Ok(()),
        }
    }

    fn simulate(&mut self, commands: &SideCommands) -> Result<GameState, Abort> {
        self.check_clock()?;
        self.simulations += 1;
        let (next, _) = simulate_round(self.state, commands)?;
        Ok(next)
    }

    fn score(&self, next: &GameState, side: Side) -> i32 {
        self.scorer.score(next, side, Some(self.state))
    }

    /// Stage 1: best single move per opposing piece, acting side still.
    fn predict_reply(&mut self, acting: Side) -> Result<Vec<Movement>, Abort> {
        let opponent = acting.opposite();
        let still = self.simulate(&[Vec::new(), Vec::new()])?;
        let baseline = self.score(&still, opponent);

        let pieces: Vec<Piece> = self.state.living_pieces(opponent).copied().collect();
        let mut reply = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let mut best = Movement::stay(piece.id);
            let mut best_score = baseline;
            for direction in Direction::ALL {
                let reach = free_run(self.state, opponent, &piece, direction, self.max_distance);
                for distance in 1..=reach {
                    let movement = Movement::new(piece.id, direction, distance);
                    let mut commands: SideCommands = [Vec::new(), Vec::new()];
                    commands[opponent.index()].push(movement);
                    let next = match self.simulate(&commands) {
                        Ok(next) => next,
                        Err(Abort::Fault(e)) => {
                            warn!(side = ?opponent, piece_id = piece.id, error = %e, "reply prediction fault, assuming stay");
                            continue;
                        }
                        Err(timeout) => return Err(timeout),
                    };
                    let score = self.score(&next, opponent);
                    if score > best_score
                        || (score == best_score && key_of(&movement) < key_of(&best))
                    {
                        best = movement;
                        best_score = score;
                    }
                }
            }
            reply.push(best);
        }
        Ok(reply)
    }

    /// Stage 2: per piece, per direction, best distance against the reply.
    fn piece_candidates(
        &mut self,
        side: Side,
        piece: &Piece,
        reply: &[Movement],
        baseline_score: i32,
        baseline: &GameState,
    ) -> Result<PieceCandidates, Abort> {
        let stay = Candidate {
            movement: Movement::stay(piece.id),
            delta: 0,
            destination: baseline
                .piece(side, piece.id)
                .map(Piece::cell)
                .unwrap_or(piece.cell()),
        };
        let mut candidates = vec![stay];

        for direction in Direction::ALL {
            let mut bucket: Option<Candidate> = None;
            let mut bucket_delta = 0;
            let reach = free_run(self.state, side, piece, direction, self.max_distance);
            for distance in 1..=reach {
                let movement = Movement::new(piece.id, direction, distance);
                let mut commands: SideCommands = [Vec::new(), Vec::new()];
                commands[side.index()].push(movement);
                commands[side.opposite().index()] = reply.to_vec();

                let next = self.simulate(&commands)?;
                let delta = self.score(&next, side) - baseline_score;
                if delta > bucket_delta {
                    let destination = next
                        .piece(side, piece.id)
                        .map(Piece::cell)
                        .ok_or(EngineError::UnknownPiece {
                            side,
                            piece_id: piece.id,
                        })?;
                    bucket = Some(Candidate {
                        movement,
                        delta,
                        destination,
                    });
                    bucket_delta = delta;
                }
            }
            candidates.extend(bucket);
        }

        candidates.sort_by_key(Candidate::key);
        Ok(PieceCandidates {
            piece_id: piece.id,
            candidates,
        })
    }
}

#[inline]
fn key_of(movement: &Movement) -> (u8, u8) {
    if movement.is_stay() {
        (0, 0)
    } else {
        (movement.distance, movement.direction.order())
    }
}

fn all_stay(state: &GameState, side: Side) -> Vec<Movement> {
    state
        .living_pieces(side)
        .map(|p| Movement::stay(p.id))
        .collect()
}

/// Choose one movement per living piece of `side`.
///
/// Never fails: faults degrade single pieces to a stay, and an exhausted
/// time budget degrades the whole answer to all stays.
pub fn explore_positions<S: BoardScorer>(
    state: &GameState,
    side: Side,
    scorer: &S,
    config: SearchConfig,
) -> ExplorationResult {
    let started_at = Instant::now();
    let deadline = config
        .movetime_ms
        .map(|ms| started_at + Duration::from_millis(ms));
    let board_reach = u8::try_from(state.config.max_dimension()).unwrap_or(u8::MAX);

    // Rescuers go home before anything moves, so reach and every simulated
    // round start from the reset positions.
    let mut start = state.clone();
    let prepared = apply_pending_resets(&mut start);

    let mut explorer = Explorer {
        state: &start,
        scorer,
        max_distance: config.max_distance.unwrap_or(board_reach).min(board_reach),
        deadline,
        simulations: 0,
    };

    let outcome = prepared
        .map_err(Abort::from)
        .and_then(|()| run_stages(&mut explorer, side));
    let mut result = match outcome {
        Ok(result) => result,
        Err(abort) => {
            match abort {
                Abort::TimedOut => warn!(?side, "search budget exhausted, falling back to all stays"),
                Abort::Fault(ref e) => warn!(?side, error = %e, "search fault, falling back to all stays"),
            }
            ExplorationResult {
                movements: all_stay(state, side),
                timed_out: matches!(abort, Abort::TimedOut),
                ..ExplorationResult::default()
            }
        }
    };

    result.simulations = explorer.simulations;
    result.elapsed_ms = started_at.elapsed().as_millis() as u64;
    debug!(
        ?side,
        simulations = result.simulations,
        elapsed_ms = result.elapsed_ms,
        total_delta = result.total_delta,
        "exploration finished"
    );
    result
}

fn run_stages<S: BoardScorer>(explorer: &mut Explorer<'_, S>, side: Side) -> Result<ExplorationResult, Abort> {
    let state = explorer.state;
    let reply = explorer.predict_reply(side)?;

    let mut baseline_commands: SideCommands = [Vec::new(), Vec::new()];
    baseline_commands[side.opposite().index()] = reply.clone();
    let baseline = explorer.simulate(&baseline_commands)?;
    let baseline_score = explorer.score(&baseline, side);

    let pieces: Vec<Piece> = state.living_pieces(side).copied().collect();
    let mut per_piece = Vec::with_capacity(pieces.len());
    for piece in &pieces {
        match explorer.piece_candidates(side, piece, &reply, baseline_score, &baseline) {
            Ok(candidates) => per_piece.push(candidates),
            Err(Abort::Fault(e)) => {
                warn!(?side, piece_id = piece.id, error = %e, "candidate search fault, piece stays");
                per_piece.push(PieceCandidates {
                    piece_id: piece.id,
                    candidates: vec![Candidate {
                        movement: Movement::stay(piece.id),
                        delta: 0,
                        destination: piece.cell(),
                    }],
                });
            }
            Err(timeout) => return Err(timeout),
        }
    }

    let assembled = assemble(&per_piece, explorer)?;
    Ok(ExplorationResult {
        movements: assembled
            .picks
            .iter()
            .zip(&per_piece)
            .map(|(&pick, piece)| piece.candidates[pick].movement)
            .collect(),
        total_delta: assembled.total,
        baseline_score,
        predicted_reply: reply,
        per_piece,
        stacking_unavoidable: assembled.stacking,
        ..ExplorationResult::default()
    })
}

struct Assembly {
    picks: Vec<usize>,
    total: i32,
    stacking: bool,
}

fn has_stacking(per_piece: &[PieceCandidates], picks: &[usize]) -> bool {
    for i in 0..picks.len() {
        let a = per_piece[i].candidates[picks[i]].destination;
        for j in (i + 1)..picks.len() {
            if per_piece[j].candidates[picks[j]].destination == a {
                return true;
            }
        }
    }
    false
}

/// Stage 3: best non-stacking combination.
///
/// Enumeration runs in lexicographic candidate order with the first piece
/// as the most significant digit, so keeping only strict improvements
/// selects the smallest key among equal totals.
fn assemble<S: BoardScorer>(per_piece: &[PieceCandidates], explorer: &Explorer<'_, S>) -> Result<Assembly, Abort> {
    let combinations = per_piece
        .iter()
        .try_fold(1u64, |acc, p| acc.checked_mul(p.candidates.len() as u64))
        .unwrap_or(u64::MAX);
    if combinations > MAX_COMBINATIONS {
        debug!(combinations, "too many combinations, assembling greedily");
        return Ok(assemble_greedy(per_piece));
    }

    let n = per_piece.len();
    let mut picks = vec![0usize; n];
    let mut best: Option<(i32, Vec<usize>)> = None;
    let mut best_stacking: Option<(i32, Vec<usize>)> = None;
    let mut visited = 0u64;

    loop {
        visited += 1;
        if visited % 4096 == 0 {
            explorer.check_clock()?;
        }

        let total: i32 = picks
            .iter()
            .zip(per_piece)
            .map(|(&pick, p)| p.candidates[pick].delta)
            .sum();
        let slot = if has_stacking(per_piece, &picks) {
            &mut best_stacking
        } else {
            &mut best
        };
        if slot.as_ref().map_or(true, |(t, _)| total > *t) {
            *slot = Some((total, picks.clone()));
        }

        // Odometer step, least significant digit last.
        let mut digit = n;
        loop {
            if digit == 0 {
                let (chosen, stacking) = match (best, best_stacking) {
                    (Some(b), _) => (b, false),
                    (None, Some(s)) => (s, true),
                    (None, None) => ((0, Vec::new()), false),
                };
                return Ok(Assembly {
                    picks: chosen.1,
                    total: chosen.0,
                    stacking,
                });
            }
            digit -= 1;
            picks[digit] += 1;
            if picks[digit] < per_piece[digit].candidates.len() {
                break;
            }
            picks[digit] = 0;
        }
    }
}

/// Roster-order greedy pick: each piece takes its best candidate whose
/// destination is still free, or stays.
fn assemble_greedy(per_piece: &[PieceCandidates]) -> Assembly {
    let mut taken: Vec<Cell> = Vec::with_capacity(per_piece.len());
    let mut picks = Vec::with_capacity(per_piece.len());
    let mut total = 0;
    let mut stacking = false;

    for piece in per_piece {
        let mut order: Vec<usize> = (0..piece.candidates.len()).collect();
        order.sort_by(|&a, &b| {
            let (ca, cb) = (&piece.candidates[a], &piece.candidates[b]);
            cb.delta.cmp(&ca.delta).then(ca.key().cmp(&cb.key()))
        });
        let pick = order
            .iter()
            .copied()
            .find(|&i| !taken.contains(&piece.candidates[i].destination))
            .unwrap_or_else(|| {
                stacking = true;
                0
            });
        taken.push(piece.candidates[pick].destination);
        total += piece.candidates[pick].delta;
        picks.push(pick);
    }
    Assembly {
        picks,
        total,
        stacking,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::board_config::BoardConfig;
    use crate::game_state::game_state::PendingReset;
    use crate::search::board_scoring::FlagRushScorer;

    fn playing() -> GameState {
        GameState::new_playing(BoardConfig::standard()).expect("standard board")
    }

    fn scorer() -> FlagRushScorer {
        FlagRushScorer::default()
    }

    fn chosen(result: &ExplorationResult, piece_id: u8) -> Candidate {
        let movement = result
            .movements
            .iter()
            .find(|m| m.piece_id == piece_id)
            .copied()
            .expect("piece has a movement");
        result
            .per_piece
            .iter()
            .find(|p| p.piece_id == piece_id)
            .and_then(|p| p.candidates.iter().find(|c| c.movement == movement))
            .copied()
            .expect("chosen movement is a listed candidate")
    }

    fn best_alone(result: &ExplorationResult, piece_id: u8) -> i32 {
        result
            .per_piece
            .iter()
            .find(|p| p.piece_id == piece_id)
            .and_then(|p| p.candidates.iter().map(|c| c.delta).max())
            .expect("piece was searched")
    }

    /// Two North raiders on South's back rank, both able to reach the flag,
    /// with South defenders lined up to run them down.
    fn double_raid() -> GameState {
        let mut state = playing();
        state.place_piece(Side::North, 0, Cell::new(0, 9)).expect("piece exists");
        state.place_piece(Side::North, 2, Cell::new(6, 9)).expect("piece exists");
        state.place_piece(Side::South, 0, Cell::new(0, 4)).expect("piece exists");
        state.place_piece(Side::South, 1, Cell::new(3, 4)).expect("piece exists");
        state.place_piece(Side::South, 2, Cell::new(6, 4)).expect("piece exists");
        state
    }

    #[test]
    fn symmetric_start_keeps_everyone_still() {
        let state = playing();
        for side in Side::ALL {
            let result = explore_positions(&state, side, &scorer(), SearchConfig::default());
            assert_eq!(result.movements.len(), 3);
            assert!(result.movements.iter().all(Movement::is_stay));
            assert_eq!(result.total_delta, 0);
            assert!(result.predicted_reply.iter().all(Movement::is_stay));
            assert!(!result.timed_out);
            assert!(result.simulations > 0);
        }
    }

    #[test]
    fn clear_line_to_enemy_flag_lands_exactly_on_it() {
        let mut state = playing();
        // North 1 stands four cells above South's flag with nothing between.
        state.place_piece(Side::North, 1, Cell::new(3, 5)).expect("piece exists");
        state.place_piece(Side::South, 1, Cell::new(6, 7)).expect("piece exists");

        let result = explore_positions(&state, Side::North, &scorer(), SearchConfig::default());
        let pick = chosen(&result, 1);
        assert_eq!(pick.movement, Movement::new(1, Direction::Down, 4));
        assert_eq!(pick.destination, Cell::new(3, 9));
        // Pickup completes within the round, so possession is credited.
        assert!(pick.delta >= 8000);
        assert!(result.total_delta >= pick.delta);
    }

    #[test]
    fn rescuer_is_searched_from_its_spawn() {
        let mut state = playing();
        let key = state.config.key_positions[Side::North.index()];
        // Last round's rescuer still stands on the key; it returns to (3,3)
        // before this round moves anyone.
        state.place_piece(Side::North, 1, key).expect("piece exists");
        state.pending_resets.push(PendingReset {
            side: Side::North,
            piece_id: 1,
        });
        state.place_piece(Side::South, 1, Cell::new(6, 7)).expect("piece exists");

        let result = explore_positions(&state, Side::North, &scorer(), SearchConfig::default());
        let north_1 = result
            .per_piece
            .iter()
            .find(|p| p.piece_id == 1)
            .expect("piece was searched");
        assert_eq!(north_1.candidates[0].destination, Cell::new(3, 3));

        let pick = chosen(&result, 1);
        assert_eq!(pick.movement, Movement::new(1, Direction::Down, 6));
        assert_eq!(pick.destination, Cell::new(3, 9));
        assert!(pick.delta >= 8000);
    }

    #[test]
    fn moves_away_from_a_capture_get_no_capture_credit() {
        let mut state = playing();
        // South 0 will run North 0 down in South's territory; North 1 has an
        // open column to the flag that no South piece crosses.
        state.place_piece(Side::North, 0, Cell::new(0, 8)).expect("piece exists");
        state.place_piece(Side::South, 0, Cell::new(0, 4)).expect("piece exists");
        state.place_piece(Side::North, 1, Cell::new(3, 5)).expect("piece exists");
        state.place_piece(Side::South, 1, Cell::new(6, 7)).expect("piece exists");

        let scorer = scorer();
        let result = explore_positions(&state, Side::North, &scorer, SearchConfig::default());
        assert_eq!(result.predicted_reply[0].direction, Direction::Down);

        let reply_only: SideCommands = [Vec::new(), result.predicted_reply.clone()];
        let (baseline, _) = simulate_round(&state, &reply_only).expect("baseline simulates");
        let baseline_breakdown = scorer.breakdown(&baseline, Side::North, Some(&state));
        assert_eq!(baseline_breakdown.net_captures, -1000);
        assert_eq!(baseline_breakdown.total, result.baseline_score);

        let pick = chosen(&result, 1);
        assert_eq!(pick.movement, Movement::new(1, Direction::Down, 4));
        let with_move: SideCommands = [vec![pick.movement], result.predicted_reply.clone()];
        let (next, _) = simulate_round(&state, &with_move).expect("candidate simulates");
        let breakdown = scorer.breakdown(&next, Side::North, Some(&state));

        // The capture elsewhere shows up in both states and cancels out.
        assert_eq!(breakdown.net_captures, baseline_breakdown.net_captures);
        assert_eq!(pick.delta, breakdown.total - baseline_breakdown.total);
        assert_eq!(
            pick.delta,
            breakdown.flag_possession + breakdown.in_enemy_zone + breakdown.on_enemy_back_rank
                - baseline_breakdown.flag_possession
                - baseline_breakdown.in_enemy_zone
                - baseline_breakdown.on_enemy_back_rank
        );
    }

    #[test]
    fn shared_best_destination_is_not_stacked() {
        let state = double_raid();
        let result = explore_positions(&state, Side::North, &scorer(), SearchConfig::default());
        let flag = Cell::new(3, 9);

        for id in [0, 2] {
            let best = result
                .per_piece
                .iter()
                .find(|p| p.piece_id == id)
                .and_then(|p| p.candidates.iter().max_by_key(|c| c.delta))
                .expect("piece was searched");
            assert_eq!(best.destination, flag);
        }

        assert_ne!(chosen(&result, 0).destination, chosen(&result, 2).destination);
        assert!(!result.stacking_unavoidable);
        assert!(result.total_delta > 0);
        assert!(result.total_delta <= best_alone(&result, 0) + best_alone(&result, 2));
        // Equal totals go to the smaller roster-order key: piece 0 staying
        // beats piece 0 moving.
        assert!(chosen(&result, 0).movement.is_stay());
        assert_eq!(chosen(&result, 2).destination, flag);
    }

    #[test]
    fn unavoidable_losses_are_absorbed_by_the_baseline() {
        let state = double_raid();
        let result = explore_positions(&state, Side::North, &scorer(), SearchConfig::default());

        // The predicted reply runs both raiders down if they stand still.
        assert_eq!(result.predicted_reply[0], Movement::new(0, Direction::Down, 5));
        assert_eq!(result.predicted_reply[2], Movement::new(2, Direction::Down, 5));
        assert!(result.baseline_score < 0);

        // North 1 is nowhere near the action and gets no credit either way.
        let north_1 = result
            .per_piece
            .iter()
            .find(|p| p.piece_id == 1)
            .expect("piece was searched");
        assert_eq!(north_1.candidates.len(), 1);
        assert_eq!(north_1.candidates[0].delta, 0);
    }

    #[test]
    fn zero_reach_only_offers_stays() {
        let state = double_raid();
        let result = explore_positions(
            &state,
            Side::North,
            &scorer(),
            SearchConfig {
                max_distance: Some(0),
                ..SearchConfig::default()
            },
        );
        assert!(result.movements.iter().all(Movement::is_stay));
        assert!(result.per_piece.iter().all(|p| p.candidates.len() == 1));
        assert_eq!(result.total_delta, 0);
    }

    #[test]
    fn exhausted_budget_degrades_to_all_stays() {
        let mut state = playing();
        state.place_piece(Side::North, 1, Cell::new(3, 5)).expect("piece exists");
        let result = explore_positions(
            &state,
            Side::North,
            &scorer(),
            SearchConfig {
                movetime_ms: Some(0),
                ..SearchConfig::default()
            },
        );
        assert!(result.timed_out);
        assert_eq!(result.movements.len(), 3);
        assert!(result.movements.iter().all(Movement::is_stay));
    }

    #[test]
    fn jailed_pieces_get_no_movement() {
        let mut state = playing();
        state.jail_piece(Side::North, 1).expect("piece exists");
        let result = explore_positions(&state, Side::North, &scorer(), SearchConfig::default());
        assert_eq!(result.movements.len(), 2);
        assert!(result.movements.iter().all(|m| m.piece_id != 1));
    }

    #[test]
    fn greedy_assembly_avoids_taken_cells() {
        let cell = Cell::new(2, 2);
        let candidates = |id: u8, home: Cell, direction: Direction| PieceCandidates {
            piece_id: id,
            candidates: vec![
                Candidate {
                    movement: Movement::stay(id),
                    delta: 0,
                    destination: home,
                },
                Candidate {
                    movement: Movement::new(id, direction, 2),
                    delta: 500,
                    destination: cell,
                },
            ],
        };
        let per_piece = vec![
            candidates(0, Cell::new(0, 2), Direction::Right),
            candidates(1, Cell::new(4, 2), Direction::Left),
        ];
        let assembly = assemble_greedy(&per_piece);
        assert_eq!(assembly.picks, vec![1, 0]);
        assert_eq!(assembly.total, 500);
        assert!(!assembly.stacking);
    }
}
