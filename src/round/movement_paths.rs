//! Movement path resolution.
//!
//! Turns at most one command per living piece into a per-step path. Each
//! piece is traced in isolation: board edges and the mover's own active
//! no-guard zone are the only obstacles here. Interaction between pieces
//! is left to the collision stage.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game_state::game_state::{GameState, Piece};
use crate::game_state::game_types::{Cell, Direction, Movement, Side, SideCommands};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub x: i32,
    pub y: i32,
    pub step: u32,
}

impl PathStep {
    #[inline]
    pub const fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

/// Full path of one living piece for one round.
///
/// `path[0]` is the starting cell and every record of a round has the same
/// length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    pub side: Side,
    pub piece_id: u8,
    pub path: Vec<PathStep>,
    pub final_position: Cell,
}

impl PathRecord {
    fn from_cells(side: Side, piece_id: u8, cells: &[Cell]) -> Self {
        let path: Vec<PathStep> = cells
            .iter()
            .enumerate()
            .map(|(step, c)| PathStep {
                x: c.x,
                y: c.y,
                step: step as u32,
            })
            .collect();
        let final_position = cells.last().copied().unwrap_or(Cell::new(0, 0));
        Self {
            side,
            piece_id,
            path,
            final_position,
        }
    }

    #[inline]
    pub fn cell_at(&self, step: usize) -> Cell {
        self.path
            .get(step)
            .or_else(|| self.path.last())
            .map(PathStep::cell)
            .unwrap_or(self.final_position)
    }

    #[inline]
    pub fn start(&self) -> Cell {
        self.cell_at(0)
    }

    /// Stop the piece at `step`: every later entry repeats that cell.
    pub fn truncate_at(&mut self, step: usize) {
        let stop = self.cell_at(step);
        for entry in self.path.iter_mut().skip(step + 1) {
            entry.x = stop.x;
            entry.y = stop.y;
        }
        self.final_position = stop;
    }

    /// Number of cells actually travelled.
    pub fn travelled(&self) -> usize {
        self.path
            .windows(2)
            .filter(|w| w[0].cell() != w[1].cell())
            .count()
    }
}

/// Keep the first command for each living piece of `side`; drop the rest.
pub fn sanitize_commands(state: &GameState, side: Side, commands: &[Movement]) -> Vec<Movement> {
    let mut accepted: Vec<Movement> = Vec::with_capacity(commands.len());
    for movement in commands {
        let alive = state.piece(side, movement.piece_id).is_some_and(|p| p.alive);
        if !alive {
            debug!(?side, piece_id = movement.piece_id, "dropping command for missing or jailed piece");
            continue;
        }
        if accepted.iter().any(|m| m.piece_id == movement.piece_id) {
            debug!(?side, piece_id = movement.piece_id, "dropping duplicate command");
            continue;
        }
        accepted.push(*movement);
    }
    accepted
}

/// Resolve every living piece's path for one round.
///
/// Records are ordered North first, then South, each in roster order.
/// Pieces without a command stay put. All paths are padded to the longest
/// requested distance by repeating their final cell.
pub fn resolve_movement_paths(state: &GameState, commands: &SideCommands) -> Vec<PathRecord> {
    let accepted = [
        sanitize_commands(state, Side::North, &commands[Side::North.index()]),
        sanitize_commands(state, Side::South, &commands[Side::South.index()]),
    ];
    let round_length = accepted
        .iter()
        .flatten()
        .map(|m| usize::from(m.distance))
        .max()
        .unwrap_or(0);

    let mut records = Vec::new();
    for side in Side::ALL {
        for piece in state.living_pieces(side) {
            let movement = accepted[side.index()]
                .iter()
                .find(|m| m.piece_id == piece.id);
            let mut cells = trace_path(state, side, piece, movement);
            let last = *cells.last().unwrap_or(&piece.cell());
            cells.resize(round_length + 1, last);
            records.push(PathRecord::from_cells(side, piece.id, &cells));
        }
    }
    records
}

/// How far a piece could travel in `direction`, capped at `limit`, before
/// the board edge or its own active zone stops it. Other pieces are ignored.
pub fn free_run(state: &GameState, side: Side, piece: &Piece, direction: Direction, limit: u8) -> u8 {
    let probe = Movement::new(piece.id, direction, limit);
    let cells = trace_path(state, side, piece, Some(&probe));
    (cells.len() - 1) as u8
}

fn trace_path(state: &GameState, side: Side, piece: &Piece, movement: Option<&Movement>) -> Vec<Cell> {
    let mut current = piece.cell();
    let mut cells = vec![current];
    let Some(movement) = movement else {
        return cells;
    };

    let config = &state.config;
    let zone_blocks =
        state.zones_active[side.index()] && !state.is_carrying_opposing_flag(side, piece.id);

    for _ in 0..movement.distance {
        let next = current.step(movement.direction);
        if !config.in_bounds(next) {
            break;
        }
        if zone_blocks && config.in_no_guard_zone(side, next) {
            break;
        }
        cells.push(next);
        current = next;
    }
    cells
}
