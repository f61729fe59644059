//! Match room: the single owner of one match's live state.
//!
//! Clients and bots submit commands at any time; they are buffered per side
//! and consumed by the next `tick`. A tick runs exactly one round, then
//! clears both buffers, so commands that arrive after a tick belong to the
//! following round. Missing commands mean "stay": a slow or absent side
//! never holds the round back.
//!
//! The room has no clock and no lock. The host drives `tick` on its own
//! timer and serializes access.

use tracing::{debug, info, warn};

use crate::engines::engine_trait::{Engine, GoParams};
use crate::errors::{ConfigError, EngineError};
use crate::game_state::board_config::BoardConfig;
use crate::game_state::game_state::GameState;
use crate::game_state::game_types::{MatchStatus, Movement, RawCommand, Side, SideCommands};
use crate::round::capture_events::CaptureListener;
use crate::round::round_executor::{execute_round, RoundReport};

pub struct MatchRoom {
    state: GameState,
    pending: SideCommands,
    engines: [Option<Box<dyn Engine>>; 2],
    go_params: GoParams,
    listeners: Vec<Box<dyn CaptureListener + Send>>,
    last_report: Option<RoundReport>,
}

impl MatchRoom {
    pub fn new(config: BoardConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            state: GameState::new(config)?,
            pending: [Vec::new(), Vec::new()],
            engines: [None, None],
            go_params: GoParams::default(),
            listeners: Vec::new(),
            last_report: None,
        })
    }

    /// Parameters handed to bot engines on every tick.
    pub fn set_go_params(&mut self, params: GoParams) {
        self.go_params = params;
    }

    #[inline]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[inline]
    pub fn status(&self) -> MatchStatus {
        self.state.status
    }

    pub fn last_report(&self) -> Option<&RoundReport> {
        self.last_report.as_ref()
    }

    pub fn pending_commands(&self, side: Side) -> &[Movement] {
        &self.pending[side.index()]
    }

    /// Waiting -> Playing. Returns whether the status changed.
    pub fn start(&mut self) -> bool {
        self.transition(MatchStatus::Waiting, MatchStatus::Playing)
    }

    pub fn pause(&mut self) -> bool {
        self.transition(MatchStatus::Playing, MatchStatus::Paused)
    }

    pub fn resume(&mut self) -> bool {
        self.transition(MatchStatus::Paused, MatchStatus::Playing)
    }

    fn transition(&mut self, from: MatchStatus, to: MatchStatus) -> bool {
        if self.state.status != from {
            debug!(current = ?self.state.status, requested = ?to, "ignoring status change");
            return false;
        }
        self.state.status = to;
        info!(round = self.state.round, status = ?to, "match status changed");
        true
    }

    /// Replace `side`'s commands for the next round.
    pub fn submit_commands(&mut self, side: Side, commands: Vec<Movement>) {
        self.pending[side.index()] = commands;
    }

    /// Replace `side`'s commands from untrusted input.
    ///
    /// Unusable entries are dropped; the rest are kept in order. Returns how
    /// many were kept.
    pub fn submit_raw_commands(&mut self, side: Side, commands: &[RawCommand]) -> usize {
        let movements: Vec<Movement> = commands
            .iter()
            .filter_map(|raw| {
                let movement = raw.to_movement();
                if movement.is_none() {
                    debug!(?side, ?raw, "dropping unusable command");
                }
                movement
            })
            .collect();
        let kept = movements.len();
        self.submit_commands(side, movements);
        kept
    }

    /// Let `engine` play `side`. Its answer replaces that side's submitted
    /// commands on every tick.
    pub fn assign_engine(&mut self, side: Side, mut engine: Box<dyn Engine>) {
        engine.new_match();
        info!(?side, engine = engine.name(), "engine assigned");
        self.engines[side.index()] = Some(engine);
    }

    pub fn clear_engine(&mut self, side: Side) -> Option<Box<dyn Engine>> {
        self.engines[side.index()].take()
    }

    pub fn add_capture_listener(&mut self, listener: Box<dyn CaptureListener + Send>) {
        self.listeners.push(listener);
    }

    /// Run one round and return the exported state.
    ///
    /// Outside `Playing` nothing runs and buffered commands are kept.
    pub fn tick(&mut self) -> Result<GameState, EngineError> {
        if self.state.status != MatchStatus::Playing {
            debug!(status = ?self.state.status, "tick skipped");
            return Ok(self.state.clone());
        }

        for side in Side::ALL {
            let Some(engine) = self.engines[side.index()].as_mut() else {
                continue;
            };
            match engine.choose_movements(&self.state, side, &self.go_params) {
                Ok(out) => {
                    for line in &out.info_lines {
                        debug!(?side, engine = engine.name(), "{line}");
                    }
                    self.pending[side.index()] = out.movements;
                }
                Err(e) => {
                    warn!(?side, engine = engine.name(), error = %e, "engine failed, side stays");
                    self.pending[side.index()].clear();
                }
            }
        }

        let commands = std::mem::take(&mut self.pending);
        let mut listeners: Vec<&mut dyn CaptureListener> = self
            .listeners
            .iter_mut()
            .map(|l| l.as_mut() as &mut dyn CaptureListener)
            .collect();
        let report = execute_round(&mut self.state, &commands, &mut listeners)?;

        if report.finished {
            info!(round = report.round, winner = ?report.winner, "match finished");
        }
        self.last_report = Some(report);
        Ok(self.state.clone())
    }

    pub fn export_json(&self) -> Result<String, EngineError> {
        self.state.to_json()
    }
}
