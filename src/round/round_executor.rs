//! Round execution.
//!
//! One call executes one tick: pending rescuer resets, path resolution,
//! collision resolution (with capture notifications), the flag pass and the
//! rescue pass. The work happens on a private copy that replaces the live
//! state only when the whole pipeline succeeded.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::EngineError;
use crate::game_state::game_state::GameState;
use crate::game_state::game_types::{MatchStatus, Side, SideCommands};
use crate::round::capture_events::{CaptureEvent, CaptureListener};
use crate::round::collisions::{resolve_collisions, Collision};
use crate::round::flags::{run_flag_pass, FlagEvent, FlagManager};
use crate::round::movement_paths::{resolve_movement_paths, PathRecord};
use crate::round::rescue_keys::{apply_pending_resets, run_rescue_pass, RescueEvent};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u32,
    /// `false` when the match was not in `Playing` and nothing happened.
    pub executed: bool,
    pub paths: Vec<PathRecord>,
    pub collisions: Vec<Collision>,
    pub captures: Vec<CaptureEvent>,
    pub flag_events: Vec<FlagEvent>,
    pub rescues: Vec<RescueEvent>,
    pub finished: bool,
    pub winner: Option<Side>,
}

/// Execute one round against the live state.
///
/// `listeners` are notified of captures after the built-in flag manager.
pub fn execute_round(
    state: &mut GameState,
    commands: &SideCommands,
    listeners: &mut [&mut dyn CaptureListener],
) -> Result<RoundReport, EngineError> {
    if state.status != MatchStatus::Playing {
        return Ok(RoundReport {
            round: state.round,
            ..RoundReport::default()
        });
    }
    let mut next = state.clone();
    let report = run_pipeline(&mut next, commands, listeners)?;
    *state = next;
    Ok(report)
}

/// Run a round on a copy, leaving `state` untouched.
pub fn simulate_round(
    state: &GameState,
    commands: &SideCommands,
) -> Result<(GameState, RoundReport), EngineError> {
    let mut next = state.clone();
    if next.status != MatchStatus::Playing {
        let round = next.round;
        return Ok((
            next,
            RoundReport {
                round,
                ..RoundReport::default()
            },
        ));
    }
    let report = run_pipeline(&mut next, commands, &mut [])?;
    Ok((next, report))
}

fn run_pipeline(
    state: &mut GameState,
    commands: &SideCommands,
    listeners: &mut [&mut dyn CaptureListener],
) -> Result<RoundReport, EngineError> {
    apply_pending_resets(state)?;
    state.round += 1;

    let mut paths = resolve_movement_paths(state, commands);

    let mut flag_manager = FlagManager;
    let mut subscribers: Vec<&mut dyn CaptureListener> = Vec::with_capacity(listeners.len() + 1);
    subscribers.push(&mut flag_manager);
    for listener in listeners.iter_mut() {
        subscribers.push(&mut **listener);
    }
    let collisions = resolve_collisions(state, &mut paths, &mut subscribers)?;

    let flags = run_flag_pass(state);
    let rescues = run_rescue_pass(state)?;

    debug!(
        round = state.round,
        collisions = collisions.collisions.len(),
        captures = collisions.captures.len(),
        flag_events = flags.events.len(),
        rescues = rescues.len(),
        "round executed"
    );

    Ok(RoundReport {
        round: state.round,
        executed: true,
        paths,
        collisions: collisions.collisions,
        captures: collisions.captures,
        flag_events: flags.events,
        rescues,
        finished: flags.finished,
        winner: flags.winner,
    })
}
