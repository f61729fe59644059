//! Standalone engine-vs-engine series runner.
//!
//! Run with:
//! `cargo run --release --bin engine_match_series`
//! `RUST_LOG=flag_rush=debug cargo run --release --bin engine_match_series -- --verbose`
//! `cargo run --release --bin engine_match_series -- --board board.json`

use flag_rush::engines::engine_explorer::ExplorerEngine;
use flag_rush::engines::engine_random::RandomEngine;
use flag_rush::engines::engine_trait::{Engine, GoParams};
use flag_rush::game_state::board_config::BoardConfig;
use flag_rush::utils::engine_match_harness::{
    play_engine_match_series, MatchConfig, MatchSeriesConfig,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");

    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let board = match args.iter().position(|a| a == "--board") {
        Some(i) => {
            let path = args.get(i + 1).ok_or("--board needs a path")?;
            let json = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
            BoardConfig::from_json_str(&json).map_err(|e| e.to_string())?
        }
        None => BoardConfig::standard(),
    };

    // Swap these two lines to try other engines or scorers.
    let player1 = || Box::new(ExplorerEngine::new()) as Box<dyn Engine>;
    let player2 = || Box::new(RandomEngine::new(99)) as Box<dyn Engine>;

    let stats = play_engine_match_series(
        player1,
        player2,
        MatchSeriesConfig {
            games: 10,
            base_seed: 1234,
            per_game: MatchConfig {
                max_rounds: 150,
                go_params: GoParams {
                    tick_ms: Some(250),
                    ..GoParams::default()
                },
                board,
                ..MatchConfig::default()
            },
            verbose,
        },
    )?;

    println!("{}", stats.report());
    println!("outcomes: {:?}", stats.outcomes);
    Ok(())
}
