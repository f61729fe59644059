//! Minimal head-to-head engine match harness for local testing.
//!
//! Runs two `Engine` implementations against each other through a
//! `MatchRoom`, with an optional seeded random opening so a series does not
//! replay the same match every game.

use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::engines::engine_random::RandomEngine;
use crate::engines::engine_trait::{Engine, GoParams};
use crate::game_state::board_config::BoardConfig;
use crate::game_state::game_state::GameState;
use crate::game_state::game_types::{MatchStatus, Side};
use crate::match_room::MatchRoom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    NorthWin,
    SouthWin,
    DrawBothFlagsHome,
    DrawMaxRounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerId {
    Player1,
    Player2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesOutcome {
    PlayerWin { player: PlayerId, side: Side },
    DrawBothFlagsHome,
    DrawMaxRounds,
}

#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub max_rounds: u32,
    pub opening_min_rounds: u8,
    pub opening_max_rounds: u8,
    pub go_params: GoParams,
    pub board: BoardConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_rounds: 200,
            opening_min_rounds: 0,
            opening_max_rounds: 2,
            go_params: GoParams::default(),
            board: BoardConfig::standard(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub outcome: MatchOutcome,
    pub final_state: GameState,
    pub started_at: DateTime<Utc>,
    pub opening_rounds: u32,
    pub rounds_played: u32,
    /// Jailings suffered, indexed by `Side::index`.
    pub pieces_jailed: [u32; 2],
    pub decision_counts: [u32; 2],
    pub total_time_ns: [u128; 2],
}

#[derive(Debug, Clone)]
pub struct MatchSeriesConfig {
    pub games: u16,
    pub base_seed: u64,
    pub per_game: MatchConfig,
    pub verbose: bool,
}

impl Default for MatchSeriesConfig {
    fn default() -> Self {
        Self {
            games: 9,
            base_seed: 0,
            per_game: MatchConfig::default(),
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchSeriesStats {
    pub games: u16,
    pub player1_wins: u16,
    pub player2_wins: u16,
    pub draws: u16,
    pub outcomes: Vec<SeriesOutcome>,
    pub player1_decisions: u32,
    pub player2_decisions: u32,
    pub player1_total_time_ns: u128,
    pub player2_total_time_ns: u128,
    pub player1_avg_decision_ms: f64,
    pub player2_avg_decision_ms: f64,
    pub overall_avg_decision_ms: f64,
}

impl MatchSeriesStats {
    pub fn report(&self) -> String {
        format!(
            "games={} player1_wins={} player2_wins={} draws={} p1_avg_ms={:.3} p2_avg_ms={:.3} overall_avg_ms={:.3}",
            self.games,
            self.player1_wins,
            self.player2_wins,
            self.draws,
            self.player1_avg_decision_ms,
            self.player2_avg_decision_ms,
            self.overall_avg_decision_ms
        )
    }
}

/// Play a single seeded engine-vs-engine match.
///
/// `engine_north` plays North, `engine_south` plays South.
pub fn play_engine_match(
    mut engine_north: Box<dyn Engine>,
    mut engine_south: Box<dyn Engine>,
    seed: u64,
    config: MatchConfig,
) -> Result<MatchResult, String> {
    let started_at = Utc::now();
    let mut room = MatchRoom::new(config.board.clone()).map_err(|e| e.to_string())?;
    room.set_go_params(config.go_params.clone());
    room.start();

    engine_north.new_match();
    engine_south.new_match();

    let opening_rounds = play_seeded_random_opening(&mut room, seed, &config)?;

    let mut pieces_jailed = [0u32; 2];
    let mut decision_counts = [0u32; 2];
    let mut total_time_ns = [0u128; 2];
    let mut rounds_played = opening_rounds;

    while room.status() == MatchStatus::Playing && rounds_played < config.max_rounds {
        for side in Side::ALL {
            let engine = match side {
                Side::North => &mut engine_north,
                Side::South => &mut engine_south,
            };
            let started = Instant::now();
            let out = engine.choose_movements(room.state(), side, &config.go_params)?;
            let elapsed_ns = started.elapsed().as_nanos();

            let s = side.index();
            decision_counts[s] = decision_counts[s].saturating_add(1);
            total_time_ns[s] = total_time_ns[s].saturating_add(elapsed_ns);
            room.submit_commands(side, out.movements);
        }

        room.tick().map_err(|e| e.to_string())?;
        rounds_played += 1;
        if let Some(report) = room.last_report() {
            for capture in &report.captures {
                let s = capture.side.index();
                pieces_jailed[s] = pieces_jailed[s].saturating_add(1);
            }
        }
    }

    let final_state = room.state().clone();
    let outcome = match (final_state.status, final_state.winner) {
        (MatchStatus::Finished, Some(Side::North)) => MatchOutcome::NorthWin,
        (MatchStatus::Finished, Some(Side::South)) => MatchOutcome::SouthWin,
        (MatchStatus::Finished, None) => MatchOutcome::DrawBothFlagsHome,
        _ => MatchOutcome::DrawMaxRounds,
    };
    debug!(seed, ?outcome, rounds = rounds_played, "match complete");

    Ok(MatchResult {
        outcome,
        final_state,
        started_at,
        opening_rounds,
        rounds_played,
        pieces_jailed,
        decision_counts,
        total_time_ns,
    })
}

/// Play a series of matches and aggregate win/loss/draw statistics.
///
/// Sides are randomized each game (deterministic from `base_seed`).
pub fn play_engine_match_series<F1, F2>(
    player1_factory: F1,
    player2_factory: F2,
    config: MatchSeriesConfig,
) -> Result<MatchSeriesStats, String>
where
    F1: Fn() -> Box<dyn Engine>,
    F2: Fn() -> Box<dyn Engine>,
{
    let mut stats = MatchSeriesStats {
        games: config.games,
        ..MatchSeriesStats::default()
    };
    let mut side_rng = StdRng::seed_from_u64(config.base_seed ^ 0xA5A5_5A5A_0123_4567);

    for i in 0..config.games {
        let player1_is_north = side_rng.random_bool(0.5);
        let seed = config.base_seed.wrapping_add(u64::from(i));

        let result = if player1_is_north {
            play_engine_match(player1_factory(), player2_factory(), seed, config.per_game.clone())?
        } else {
            play_engine_match(player2_factory(), player1_factory(), seed, config.per_game.clone())?
        };

        let (p1, p2) = if player1_is_north {
            (Side::North, Side::South)
        } else {
            (Side::South, Side::North)
        };
        stats.player1_decisions = stats
            .player1_decisions
            .saturating_add(result.decision_counts[p1.index()]);
        stats.player2_decisions = stats
            .player2_decisions
            .saturating_add(result.decision_counts[p2.index()]);
        stats.player1_total_time_ns = stats
            .player1_total_time_ns
            .saturating_add(result.total_time_ns[p1.index()]);
        stats.player2_total_time_ns = stats
            .player2_total_time_ns
            .saturating_add(result.total_time_ns[p2.index()]);

        let winner_side = match result.outcome {
            MatchOutcome::NorthWin => Some(Side::North),
            MatchOutcome::SouthWin => Some(Side::South),
            MatchOutcome::DrawBothFlagsHome | MatchOutcome::DrawMaxRounds => None,
        };
        let mapped = match (winner_side, result.outcome) {
            (Some(side), _) if side == p1 => {
                stats.player1_wins += 1;
                SeriesOutcome::PlayerWin {
                    player: PlayerId::Player1,
                    side,
                }
            }
            (Some(side), _) => {
                stats.player2_wins += 1;
                SeriesOutcome::PlayerWin {
                    player: PlayerId::Player2,
                    side,
                }
            }
            (None, MatchOutcome::DrawBothFlagsHome) => {
                stats.draws += 1;
                SeriesOutcome::DrawBothFlagsHome
            }
            (None, _) => {
                stats.draws += 1;
                SeriesOutcome::DrawMaxRounds
            }
        };
        stats.outcomes.push(mapped);

        if config.verbose {
            info!(
                game = i + 1,
                of = config.games,
                seed,
                started_at = %result.started_at.to_rfc3339(),
                player1 = ?p1,
                outcome = ?mapped,
                rounds = result.rounds_played,
                p1_wins = stats.player1_wins,
                p2_wins = stats.player2_wins,
                draws = stats.draws,
                "series game finished"
            );
        }
    }

    stats.player1_avg_decision_ms =
        avg_ns_per_decision_ms(stats.player1_total_time_ns, stats.player1_decisions);
    stats.player2_avg_decision_ms =
        avg_ns_per_decision_ms(stats.player2_total_time_ns, stats.player2_decisions);

    let total_ns = stats
        .player1_total_time_ns
        .saturating_add(stats.player2_total_time_ns);
    let total_decisions = stats.player1_decisions.saturating_add(stats.player2_decisions);
    stats.overall_avg_decision_ms = avg_ns_per_decision_ms(total_ns, total_decisions);

    Ok(stats)
}

#[inline]
fn avg_ns_per_decision_ms(total_ns: u128, decisions: u32) -> f64 {
    if decisions == 0 {
        0.0
    } else {
        (total_ns as f64) / (decisions as f64) / 1_000_000.0
    }
}

/// Random rounds for both sides, seeded from `seed`. Returns how many ran.
fn play_seeded_random_opening(
    room: &mut MatchRoom,
    seed: u64,
    config: &MatchConfig,
) -> Result<u32, String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let low = config.opening_min_rounds.min(config.opening_max_rounds);
    let high = config.opening_max_rounds.max(config.opening_min_rounds);
    let target = if low == high {
        low
    } else {
        rng.random_range(low..=high)
    };

    let mut opening = [
        RandomEngine::new(rng.random()),
        RandomEngine::new(rng.random()),
    ];
    let params = GoParams {
        max_distance: Some(2),
        ..GoParams::default()
    };

    let mut played = 0;
    for _ in 0..target {
        if room.status() != MatchStatus::Playing || played >= config.max_rounds {
            break;
        }
        for side in Side::ALL {
            let out = opening[side.index()].choose_movements(room.state(), side, &params)?;
            room.submit_commands(side, out.movements);
        }
        room.tick().map_err(|e| e.to_string())?;
        played += 1;
    }
    Ok(played)
}
