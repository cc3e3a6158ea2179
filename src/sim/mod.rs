//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Simulation-time timers only, never wall clock
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod boss;
pub mod collision;
pub mod entities;
pub mod state;
pub mod tick;
pub mod timer;

pub use boss::{Boss, BossPhase};
pub use collision::{circles_overlap, clamp_to_world};
pub use entities::{
    BossProjectile, Enemy, EnemyKind, Entities, PowerUp, PowerUpKind, Projectile, ShotTarget,
};
pub use state::{
    DamageSource, GameEvent, GamePhase, Player, PowerUpEffect, Session, SessionSummary,
};
pub use tick::{TickInput, tick};
pub use timer::{Schedule, Timer};
