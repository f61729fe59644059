//! Terminal-oriented ASCII board renderer for debugging, tests, and
//! diagnostics in text environments.
//!
//! Legend: `N`/`S` living pieces, `*` opposing pieces sharing a cell,
//! `n`/`s` uncarried flags, `k` present rescue keys, `:` active no-guard
//! zone cells, `.` everything else. Carried flags are drawn under their
//! carrier and jailed pieces are not drawn.

use crate::game_state::game_state::GameState;
use crate::game_state::game_types::{Cell, Side};

/// Render the board with `y = 0` (North's back rank) on top.
pub fn render_game_state(game_state: &GameState) -> String {
    let config = &game_state.config;
    let mut out = String::new();

    let header: String = (0..config.width)
        .map(|x| char::from(b'0' + (x % 10) as u8))
        .flat_map(|c| [' ', c])
        .collect();
    out.push_str("  ");
    out.push_str(&header);
    out.push('\n');

    for y in 0..config.height {
        out.push_str(&format!("{:>2}", y % 100));
        for x in 0..config.width {
            out.push(' ');
            out.push(cell_symbol(game_state, Cell::new(x, y)));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "round {} status {:?} jailed N{:?} S{:?}",
        game_state.round,
        game_state.status,
        game_state.side(Side::North).jailed_piece_ids,
        game_state.side(Side::South).jailed_piece_ids
    ));
    out
}

fn cell_symbol(game_state: &GameState, cell: Cell) -> char {
    let occupied = |side: Side| game_state.living_pieces(side).any(|p| p.cell() == cell);
    match (occupied(Side::North), occupied(Side::South)) {
        (true, true) => return '*',
        (true, false) => return 'N',
        (false, true) => return 'S',
        (false, false) => {}
    }

    for (side, symbol) in [(Side::North, 'n'), (Side::South, 's')] {
        let flag = game_state.flags[side.index()];
        if !flag.is_carried() && flag.cell() == cell {
            return symbol;
        }
    }

    if game_state.keys.iter().any(|k| k.present && k.cell() == cell) {
        return 'k';
    }

    let in_active_zone = Side::ALL.into_iter().any(|side| {
        game_state.zones_active[side.index()] && game_state.config.in_no_guard_zone(side, cell)
    });
    if in_active_zone {
        ':'
    } else {
        '.'
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::board_config::BoardConfig;

    #[test]
    fn standard_start_renders_every_layer() {
        let state = GameState::new(BoardConfig::standard()).expect("standard board");
        let text = render_game_state(&state);
        let rows: Vec<&str> = text.lines().collect();

        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0], "   0 1 2 3 4 5 6");
        assert_eq!(rows[1], " 0 . . : n : . .");
        assert_eq!(rows[2], " 1 . . : : : . .");
        assert_eq!(rows[4], " 3 . N . N . N .");
        assert_eq!(rows[7], " 6 . S . S . S .");
        assert_eq!(rows[10], " 9 . . : s : . .");
        assert!(rows[11].starts_with("round 0 status Waiting"));
    }

    #[test]
    fn keys_and_jail_show_up() {
        let mut state = GameState::new_playing(BoardConfig::standard()).expect("standard board");
        state.jail_piece(Side::North, 0).expect("piece exists");
        state.keys[Side::North.index()].present = true;
        let text = render_game_state(&state);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[4], " 3 . . . N . N .");
        assert_eq!(rows[7], " 6 k S . S . S .");
        assert!(rows[11].contains("jailed N[0] S[]"));
    }
}
