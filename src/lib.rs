//! Crate root module declarations for the Flag Rush simulation engine.
//!
//! This file exposes all top-level subsystems (game state, round execution,
//! search, engines, the match room and utility helpers) so binaries, tests
//! and external tooling can import stable module paths.

pub mod errors;
pub mod match_room;

pub mod game_state {
    pub mod board_config;
    pub mod game_state;
    pub mod game_types;
}

pub mod round {
    pub mod capture_events;
    pub mod collisions;
    pub mod flags;
    pub mod movement_paths;
    pub mod rescue_keys;
    pub mod round_executor;
}

pub mod search {
    pub mod board_scoring;
    pub mod position_exploration;
}

pub mod engines {
    pub mod engine_explorer;
    pub mod engine_random;
    pub mod engine_trait;
    pub mod time_management;
}

pub mod utils {
    pub mod engine_match_harness;
    pub mod render_game_state;
}
