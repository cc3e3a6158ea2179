//! Star Survivor - an arcade survival shooter core
//!
//! Core modules:
//! - `sim`: Deterministic session simulation (entities, collisions, timers, boss waves)
//! - `progression`: Player profile, gold economy, combo and levels
//! - `leaderboard`: Bounded global ranking
//! - `persistence`: Save/load of the profile and leaderboard blobs
//! - `platform`: Browser/native collaborators (input, storage, ads)
//! - `context`: Owner of the profile, leaderboard and the live session
//! - `tuning`: Data-driven game balance

pub mod context;
pub mod error;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod progression;
pub mod sim;
pub mod tuning;

pub use context::GameContext;
pub use error::{GameError, GameResult};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use progression::PlayerProfile;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep in milliseconds (60 Hz)
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World dimensions in pixels, origin top-left, +y down
    pub const WORLD_WIDTH: f32 = 800.0;
    pub const WORLD_HEIGHT: f32 = 600.0;
    pub const WORLD_CENTER: Vec2 = Vec2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0);

    /// Shots this far outside the world are discarded
    pub const OFFSCREEN_MARGIN: f32 = 50.0;

    pub const PLAYER_START: Vec2 = WORLD_CENTER;

    /// Boss spawn point, above the top edge
    pub const BOSS_ENTRY: Vec2 = Vec2::new(WORLD_WIDTH / 2.0, -50.0);
    /// Boss patrol keeps this far from the side edges
    pub const BOSS_PATROL_INSET: f32 = 100.0;
}
