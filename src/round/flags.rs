//! Flag manager.
//!
//! Owns flag pickup, carrier following, return-to-spawn and win detection.
//! It also listens for captures so a flag held by a piece jailed this round
//! drops back to its spawn before the flag pass looks at the board.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::game_state::board_config::BoardConfig;
use crate::game_state::game_state::{Flag, FlagCarrier, GameState};
use crate::game_state::game_types::{MatchStatus, Side};
use crate::round::capture_events::CaptureListener;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagEvent {
    PickedUp { flag_side: Side, carrier: FlagCarrier },
    Returned { flag_side: Side },
    Won { side: Side },
    Drawn,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagPassOutcome {
    pub events: Vec<FlagEvent>,
    pub finished: bool,
    pub winner: Option<Side>,
}

/// Both flags uncarried on their spawns.
pub fn initial_flags(config: &BoardConfig) -> [Flag; 2] {
    let at = |side: Side| {
        let cell = config.flag_spawns[side.index()];
        Flag {
            x: cell.x,
            y: cell.y,
            carried_by: None,
        }
    };
    [at(Side::North), at(Side::South)]
}

pub fn return_flag_to_spawn(state: &mut GameState, flag_side: Side) {
    let spawn = state.config.flag_spawns[flag_side.index()];
    let flag = &mut state.flags[flag_side.index()];
    flag.x = spawn.x;
    flag.y = spawn.y;
    flag.carried_by = None;
    state.zones_active[flag_side.index()] = true;
}

/// Capture subscriber that drops a jailed carrier's flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagManager;

impl CaptureListener for FlagManager {
    fn on_capture(&mut self, state: &mut GameState, side: Side, piece_id: u8) {
        if let Some(flag_side) = state.flag_carried_by(side, piece_id) {
            info!(?flag_side, carrier_side = ?side, piece_id, "carrier jailed, flag returned");
            return_flag_to_spawn(state, flag_side);
        }
    }
}

/// Flag interaction for a round whose positions have settled.
pub fn run_flag_pass(state: &mut GameState) -> FlagPassOutcome {
    let mut outcome = FlagPassOutcome::default();

    for flag_side in Side::ALL {
        let Some(carrier) = state.flags[flag_side.index()].carried_by else {
            continue;
        };
        let carrier_cell = state
            .piece(carrier.side, carrier.piece_id)
            .filter(|p| p.alive)
            .map(|p| p.cell());
        match carrier_cell {
            Some(cell) => {
                let flag = &mut state.flags[flag_side.index()];
                flag.x = cell.x;
                flag.y = cell.y;
            }
            None => {
                return_flag_to_spawn(state, flag_side);
                outcome.events.push(FlagEvent::Returned { flag_side });
            }
        }
    }

    for flag_side in Side::ALL {
        let flag = state.flags[flag_side.index()];
        if flag.is_carried() {
            continue;
        }
        let taker = flag_side.opposite();
        let picker = state
            .living_pieces(taker)
            .filter(|p| p.cell() == flag.cell())
            .map(|p| p.id)
            .min();
        if let Some(piece_id) = picker {
            let carrier = FlagCarrier {
                side: taker,
                piece_id,
            };
            state.flags[flag_side.index()].carried_by = Some(carrier);
            info!(round = state.round, ?flag_side, ?carrier, "flag picked up");
            outcome.events.push(FlagEvent::PickedUp { flag_side, carrier });
        }
    }

    let config = state.config.clone();
    let winners: Vec<Side> = Side::ALL
        .into_iter()
        .filter(|&side| {
            let flag = state.flags[side.opposite().index()];
            flag.carried_by.is_some_and(|c| c.side == side)
                && config.in_home_territory(side, flag.cell())
        })
        .collect();

    match winners.as_slice() {
        [] => {}
        [side] => {
            state.status = MatchStatus::Finished;
            state.winner = Some(*side);
            outcome.finished = true;
            outcome.winner = Some(*side);
            outcome.events.push(FlagEvent::Won { side: *side });
            info!(round = state.round, winner = ?side, "match won");
        }
        _ => {
            state.status = MatchStatus::Finished;
            state.winner = None;
            outcome.finished = true;
            outcome.events.push(FlagEvent::Drawn);
            info!(round = state.round, "both flags brought home, match drawn");
        }
    }

    for side in Side::ALL {
        state.zones_active[side.index()] = !state.flags[side.index()].is_carried();
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::game_types::Cell;

    fn playing() -> GameState {
        GameState::new_playing(BoardConfig::standard()).expect("standard board")
    }

    #[test]
    fn flags_start_uncarried_on_back_ranks() {
        let state = playing();
        assert_eq!(state.flags[0].cell(), Cell::new(3, 0));
        assert_eq!(state.flags[1].cell(), Cell::new(3, 9));
        assert!(state.flags.iter().all(|f| !f.is_carried()));
    }

    #[test]
    fn living_piece_on_enemy_flag_picks_it_up_and_disables_zone() {
        let mut state = playing();
        state.place_piece(Side::North, 2, Cell::new(3, 9)).expect("piece exists");
        state.place_piece(Side::North, 1, Cell::new(3, 9)).expect("piece exists");
        let outcome = run_flag_pass(&mut state);

        let carrier = FlagCarrier {
            side: Side::North,
            piece_id: 1,
        };
        assert_eq!(state.flags[Side::South.index()].carried_by, Some(carrier));
        assert_eq!(
            outcome.events,
            vec![FlagEvent::PickedUp {
                flag_side: Side::South,
                carrier
            }]
        );
        assert!(!state.zones_active[Side::South.index()]);
        assert!(state.zones_active[Side::North.index()]);
    }

    #[test]
    fn own_flag_is_never_picked_up() {
        let mut state = playing();
        state.place_piece(Side::North, 1, Cell::new(3, 0)).expect("piece exists");
        let outcome = run_flag_pass(&mut state);
        assert!(outcome.events.is_empty());
        assert!(!state.flags[Side::North.index()].is_carried());
    }

    #[test]
    fn carried_flag_follows_carrier_and_wins_at_home() {
        let mut state = playing();
        let carrier = FlagCarrier {
            side: Side::North,
            piece_id: 0,
        };
        state.flags[Side::South.index()].carried_by = Some(carrier);
        state.place_piece(Side::North, 0, Cell::new(1, 5)).expect("piece exists");
        let outcome = run_flag_pass(&mut state);
        assert_eq!(state.flags[Side::South.index()].cell(), Cell::new(1, 5));
        assert!(!outcome.finished);

        state.place_piece(Side::North, 0, Cell::new(1, 3)).expect("piece exists");
        let outcome = run_flag_pass(&mut state);
        assert!(outcome.finished);
        assert_eq!(state.winner, Some(Side::North));
        assert_eq!(state.status, MatchStatus::Finished);
    }

    #[test]
    fn dead_carrier_flag_returns_to_spawn() {
        let mut state = playing();
        state.flags[Side::North.index()].carried_by = Some(FlagCarrier {
            side: Side::South,
            piece_id: 2,
        });
        state.zones_active[Side::North.index()] = false;
        state.piece_mut(Side::South, 2).expect("piece exists").alive = false;
        let outcome = run_flag_pass(&mut state);
        assert_eq!(
            outcome.events,
            vec![FlagEvent::Returned {
                flag_side: Side::North
            }]
        );
        assert_eq!(state.flags[Side::North.index()].cell(), Cell::new(3, 0));
        assert!(state.zones_active[Side::North.index()]);
    }

    #[test]
    fn capture_hook_drops_flag_immediately() {
        let mut state = playing();
        state.flags[Side::North.index()].carried_by = Some(FlagCarrier {
            side: Side::South,
            piece_id: 0,
        });
        state.place_piece(Side::South, 0, Cell::new(1, 2)).expect("piece exists");
        state.jail_piece(Side::South, 0).expect("piece exists");
        FlagManager.on_capture(&mut state, Side::South, 0);
        assert!(!state.flags[Side::North.index()].is_carried());
        assert_eq!(state.flags[Side::North.index()].cell(), Cell::new(3, 0));
    }

    #[test]
    fn simultaneous_homecoming_is_a_draw() {
        let mut state = playing();
        state.flags[Side::South.index()].carried_by = Some(FlagCarrier {
            side: Side::North,
            piece_id: 0,
        });
        state.flags[Side::North.index()].carried_by = Some(FlagCarrier {
            side: Side::South,
            piece_id: 0,
        });
        let outcome = run_flag_pass(&mut state);
        assert!(outcome.finished);
        assert_eq!(outcome.winner, None);
        assert_eq!(state.status, MatchStatus::Finished);
        assert_eq!(outcome.events, vec![FlagEvent::Drawn]);
    }
}
