//! Collision detection and resolution.
//!
//! Opposing pieces collide when they share a cell at the same step or swap
//! cells between two consecutive steps. Teammates never collide. Both
//! colliders stop where they met, and each one is jailed unless it stopped
//! inside its own home territory:
//! - neutral rows: both are jailed;
//! - one side's home rows: the owner survives, the invader is jailed.
//!
//! Collisions are applied in ascending step order, and every collision
//! found at the same step is applied together, so the result does not
//! depend on the order of the path records.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::EngineError;
use crate::game_state::game_state::GameState;
use crate::game_state::game_types::{Cell, Side};
use crate::round::capture_events::{CaptureEvent, CaptureListener};
use crate::round::movement_paths::PathRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    /// Both pieces occupy the same cell at the same step.
    SameCell,
    /// The pieces trade cells between `step` and `step + 1`.
    HeadOn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceRef {
    pub side: Side,
    pub piece_id: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub kind: CollisionKind,
    /// Path index both pieces stop at.
    pub step: usize,
    pub first: PieceRef,
    pub second: PieceRef,
    pub first_cell: Cell,
    pub second_cell: Cell,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionOutcome {
    pub collisions: Vec<Collision>,
    pub captures: Vec<CaptureEvent>,
}

/// Contact between two paths at step `k`, if any.
fn contact_at(a: &PathRecord, b: &PathRecord, k: usize, len: usize) -> Option<CollisionKind> {
    let (a_now, b_now) = (a.cell_at(k), b.cell_at(k));
    if a_now == b_now {
        return Some(CollisionKind::SameCell);
    }
    if k + 1 < len {
        let (a_next, b_next) = (a.cell_at(k + 1), b.cell_at(k + 1));
        if a_now == b_next && b_now == a_next {
            return Some(CollisionKind::HeadOn);
        }
    }
    None
}

fn round_length(paths: &[PathRecord]) -> Result<usize, EngineError> {
    let expected = paths.first().map(|p| p.path.len()).unwrap_or(0);
    if let Some(bad) = paths.iter().find(|p| p.path.len() != expected) {
        return Err(EngineError::RaggedPaths {
            side: bad.side,
            piece_id: bad.piece_id,
            len: bad.path.len(),
            expected,
        });
    }
    Ok(expected)
}

/// First contact of every opposing pair on the paths as given, without
/// truncating anything.
pub fn detect_collisions(paths: &[PathRecord]) -> Result<Vec<Collision>, EngineError> {
    let len = round_length(paths)?;
    let mut found = Vec::new();
    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            let (a, b) = (&paths[i], &paths[j]);
            if a.side == b.side {
                continue;
            }
            if let Some((step, kind)) = (0..len).find_map(|k| contact_at(a, b, k, len).map(|kind| (k, kind))) {
                found.push(make_collision(a, b, step, kind));
            }
        }
    }
    found.sort_by_key(|c| c.step);
    Ok(found)
}

fn make_collision(a: &PathRecord, b: &PathRecord, step: usize, kind: CollisionKind) -> Collision {
    Collision {
        kind,
        step,
        first: PieceRef {
            side: a.side,
            piece_id: a.piece_id,
        },
        second: PieceRef {
            side: b.side,
            piece_id: b.piece_id,
        },
        first_cell: a.cell_at(step),
        second_cell: b.cell_at(step),
    }
}

/// Truncate colliding paths, jail the losers and notify listeners.
///
/// On return every living piece stands on its resolved final cell and
/// jailed pieces stand where they were caught.
pub fn resolve_collisions(
    state: &mut GameState,
    paths: &mut [PathRecord],
    listeners: &mut [&mut dyn CaptureListener],
) -> Result<CollisionOutcome, EngineError> {
    let len = round_length(paths)?;
    let config = Arc::clone(&state.config);
    let n = paths.len();

    let mut caught = vec![false; n];
    let mut resolved_pair = vec![false; n * n];
    let mut outcome = CollisionOutcome::default();

    for k in 0..len {
        let mut hits = Vec::new();
        for i in 0..n {
            if caught[i] {
                continue;
            }
            for j in (i + 1)..n {
                if caught[j] || resolved_pair[i * n + j] || paths[i].side == paths[j].side {
                    continue;
                }
                if let Some(kind) = contact_at(&paths[i], &paths[j], k, len) {
                    hits.push((i, j, kind));
                }
            }
        }

        let mut losers = Vec::new();
        for (i, j, kind) in hits {
            resolved_pair[i * n + j] = true;
            outcome
                .collisions
                .push(make_collision(&paths[i], &paths[j], k, kind));
            for idx in [i, j] {
                paths[idx].truncate_at(k);
                let record = &paths[idx];
                if !config.in_home_territory(record.side, record.final_position) {
                    losers.push(idx);
                }
            }
        }
        for idx in losers {
            caught[idx] = true;
        }
    }

    for record in paths.iter() {
        state.place_piece(record.side, record.piece_id, record.final_position)?;
    }

    for (idx, record) in paths.iter().enumerate() {
        if !caught[idx] {
            continue;
        }
        if state.jail_piece(record.side, record.piece_id)? {
            info!(
                round = state.round,
                side = ?record.side,
                piece_id = record.piece_id,
                cell = %record.final_position,
                "piece jailed"
            );
            outcome.captures.push(CaptureEvent {
                round: state.round,
                side: record.side,
                piece_id: record.piece_id,
                cell: record.final_position,
            });
            for listener in listeners.iter_mut() {
                listener.on_capture(state, record.side, record.piece_id);
            }
        }
    }

    debug!(
        round = state.round,
        collisions = outcome.collisions.len(),
        captures = outcome.captures.len(),
        "collisions resolved"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::board_config::BoardConfig;
    use crate::game_state::game_types::{Direction, Movement, SideCommands};
    use crate::round::capture_events::CaptureTally;
    use crate::round::movement_paths::resolve_movement_paths;

    fn playing() -> GameState {
        GameState::new_playing(BoardConfig::standard()).expect("standard board")
    }

    fn resolve(state: &mut GameState, commands: &SideCommands) -> CollisionOutcome {
        let mut paths = resolve_movement_paths(state, commands);
        let mut tally = CaptureTally::default();
        resolve_collisions(state, &mut paths, &mut [&mut tally]).expect("collisions should resolve")
    }

    fn cell_of(state: &GameState, side: Side, id: u8) -> Cell {
        state.piece(side, id).expect("piece exists").cell()
    }

    #[test]
    fn neutral_collision_jails_both() {
        let mut state = playing();
        // North 0 at (1,3) and South 0 at (1,6) meet at step 1 on (1,4)/(1,5)
        // swap, both stop in neutral rows.
        let commands: SideCommands = [
            vec![Movement::new(0, Direction::Down, 2)],
            vec![Movement::new(0, Direction::Up, 2)],
        ];
        let outcome = resolve(&mut state, &commands);
        assert_eq!(outcome.collisions.len(), 1);
        assert_eq!(outcome.collisions[0].kind, CollisionKind::HeadOn);
        assert_eq!(outcome.captures.len(), 2);
        assert!(!state.piece(Side::North, 0).expect("piece").alive);
        assert!(!state.piece(Side::South, 0).expect("piece").alive);
        assert_eq!(cell_of(&state, Side::North, 0), Cell::new(1, 4));
        assert_eq!(cell_of(&state, Side::South, 0), Cell::new(1, 5));
    }

    #[test]
    fn same_cell_in_neutral_rows_jails_both_at_impact_point() {
        let mut state = playing();
        let commands: SideCommands = [
            vec![Movement::new(0, Direction::Down, 1)],
            vec![Movement::new(0, Direction::Up, 4)],
        ];
        // North 0 stops on (1,4) at step 1; South 0 reaches (1,4) at step 2.
        let outcome = resolve(&mut state, &commands);
        assert_eq!(outcome.collisions[0].kind, CollisionKind::SameCell);
        assert_eq!(outcome.collisions[0].step, 2);
        assert_eq!(cell_of(&state, Side::South, 0), Cell::new(1, 4));
        assert_eq!(state.side(Side::North).jailed_piece_ids, vec![0]);
        assert_eq!(state.side(Side::South).jailed_piece_ids, vec![0]);
    }

    #[test]
    fn defender_survives_in_own_territory() {
        let mut state = playing();
        // North 1 runs down column 3 into South 1 standing on (3,6).
        let commands: SideCommands = [vec![Movement::new(1, Direction::Down, 5)], vec![]];
        let outcome = resolve(&mut state, &commands);
        assert_eq!(outcome.captures.len(), 1);
        assert_eq!(outcome.captures[0].side, Side::North);
        assert!(state.piece(Side::South, 1).expect("piece").alive);
        assert_eq!(cell_of(&state, Side::North, 1), Cell::new(3, 6));
        assert_eq!(cell_of(&state, Side::South, 1), Cell::new(3, 6));
    }

    #[test]
    fn teammates_pass_through_each_other() {
        let mut state = playing();
        state.place_piece(Side::North, 0, Cell::new(2, 4)).expect("piece exists");
        state.place_piece(Side::North, 2, Cell::new(4, 4)).expect("piece exists");
        let commands: SideCommands = [
            vec![
                Movement::new(0, Direction::Right, 2),
                Movement::new(2, Direction::Left, 2),
            ],
            vec![],
        ];
        let outcome = resolve(&mut state, &commands);
        assert!(outcome.collisions.is_empty());
        assert_eq!(cell_of(&state, Side::North, 0), Cell::new(4, 4));
        assert_eq!(cell_of(&state, Side::North, 2), Cell::new(2, 4));
    }

    #[test]
    fn simultaneous_hits_do_not_depend_on_record_order() {
        let mut state = playing();
        // Two North invaders and one South piece meet on (3,5), a neutral cell.
        state.place_piece(Side::North, 0, Cell::new(2, 5)).expect("piece exists");
        state.place_piece(Side::North, 2, Cell::new(4, 5)).expect("piece exists");
        let commands: SideCommands = [
            vec![
                Movement::new(0, Direction::Right, 1),
                Movement::new(2, Direction::Left, 1),
            ],
            vec![Movement::new(1, Direction::Up, 1)],
        ];
        let outcome = resolve(&mut state, &commands);
        assert_eq!(outcome.collisions.len(), 2);
        assert_eq!(state.side(Side::North).jailed_piece_ids, vec![0, 2]);
        assert_eq!(state.side(Side::South).jailed_piece_ids, vec![1]);
    }

    #[test]
    fn jailed_piece_stops_blocking() {
        let mut state = playing();
        // South 1 is jailed at step 1 by North 1 in neutral rows; North 0
        // later crosses that cell unharmed because both earlier colliders
        // were caught.
        state.place_piece(Side::North, 1, Cell::new(3, 4)).expect("piece exists");
        state.place_piece(Side::South, 1, Cell::new(3, 5)).expect("piece exists");
        state.place_piece(Side::North, 0, Cell::new(1, 5)).expect("piece exists");
        let commands: SideCommands = [
            vec![
                Movement::new(1, Direction::Down, 1),
                Movement::new(0, Direction::Right, 4),
            ],
            vec![],
        ];
        let outcome = resolve(&mut state, &commands);
        assert_eq!(outcome.captures.len(), 2);
        assert!(state.piece(Side::North, 0).expect("piece").alive);
        assert_eq!(cell_of(&state, Side::North, 0), Cell::new(5, 5));
    }

    #[test]
    fn detection_reports_first_contact_without_mutating() {
        let state = playing();
        let commands: SideCommands = [vec![Movement::new(1, Direction::Down, 5)], vec![]];
        let paths = resolve_movement_paths(&state, &commands);
        let found = detect_collisions(&paths).expect("paths are uniform");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].step, 3);
        assert_eq!(found[0].first_cell, Cell::new(3, 6));
        assert_eq!(paths[1].final_position, Cell::new(3, 8));
    }

    #[test]
    fn ragged_paths_are_rejected() {
        let mut state = playing();
        let commands: SideCommands = [vec![Movement::new(1, Direction::Down, 2)], vec![]];
        let mut paths = resolve_movement_paths(&state, &commands);
        paths[0].path.pop();
        let result = resolve_collisions(&mut state, &mut paths, &mut []);
        assert!(matches!(result, Err(EngineError::RaggedPaths { .. })));
    }
}
