//! Data-driven game balance
//!
//! [`Tuning`] holds every balance number the simulation and the economy use.
//! `Tuning::default()` is the authoritative source; a JSON document can
//! override any subset of fields, missing keys keep their defaults.
//!
//! Times are simulation milliseconds, speeds are pixels per second, sizes are
//! collision radii in pixels.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    // === Economy ===
    /// Wallet of a freshly created profile
    pub starting_gold: u64,
    /// One-time price of the card unlock
    pub unlock_price: u64,
    pub normal_gold: u64,
    pub elite_gold: u64,
    /// Gold granted when a heart is collected at full health
    pub heart_bonus_gold: u64,

    // === Progression ===
    /// Session kills needed per profile level (`level * kills_per_level`)
    pub kills_per_level: u64,
    pub max_lives: u8,
    pub combo_window_ms: f64,
    /// Combo kills per +0.5 multiplier step
    pub combo_step: u32,

    // === Spawning ===
    pub spawn_delay_start_ms: f64,
    pub spawn_delay_step_ms: f64,
    pub spawn_delay_floor_ms: f64,
    /// Kills between spawn delay reductions
    pub spawn_ramp_kills: u64,
    /// How far outside the screen edge enemies appear
    pub spawn_margin: f32,
    pub companion_chance: f64,
    pub companion_min_level: u32,
    pub companion_delay_ms: f64,

    // === Enemies ===
    pub enemy_base_speed: f32,
    pub enemy_speed_per_level: f32,
    pub enemy_speed_time_step_ms: f64,
    pub enemy_speed_time_bonus: f32,
    pub enemy_radius: f32,
    pub elite_chance: f64,
    pub elite_min_level: u32,
    pub elite_speed_mult: f32,
    pub elite_scale: f32,
    pub elite_health: u8,

    // === Player ===
    pub player_speed: f32,
    pub player_radius: f32,
    pub invincibility_ms: f64,

    // === Auto-fire ===
    pub fire_rate_ms: f64,
    pub rapid_fire_rate_ms: f64,
    pub rapid_fire_duration_ms: f64,
    pub projectile_speed: f32,
    pub projectile_radius: f32,

    // === Power-ups ===
    pub powerup_min_delay_ms: f64,
    pub powerup_max_delay_ms: f64,
    pub powerup_lifetime_ms: f64,
    pub heart_chance: f64,
    pub powerup_radius: f32,
    /// Power-ups spawn at least this far from every screen edge
    pub powerup_inset: f32,

    // === Boss ===
    pub boss_first_ms: f64,
    pub boss_interval_ms: f64,
    pub boss_warning_ms: f64,
    pub boss_base_health: u32,
    pub boss_health_per_wave: u32,
    pub boss_shoot_ms: f64,
    /// Angular offset (radians) between the shots of one volley
    pub boss_spread: f32,
    pub boss_projectile_speed: f32,
    pub boss_projectile_radius: f32,
    pub boss_radius: f32,
    pub boss_base_gold: u64,
    pub boss_gold_per_wave: u64,
    pub boss_kill_bonus: u64,
    pub boss_cleanup_ms: f64,
    pub boss_drop_delay_ms: f64,
    pub boss_entry_ms: f64,
    pub boss_patrol_ms: f64,
    pub boss_hover_y: f32,

    // === Ads ===
    pub interstitial_interval_ms: f64,
    /// Minimum session kills for the rewarded continue offer
    pub continue_min_kills: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            starting_gold: 1000,
            unlock_price: 500,
            normal_gold: 5,
            elite_gold: 12,
            heart_bonus_gold: 100,

            kills_per_level: 10,
            max_lives: 3,
            combo_window_ms: 3000.0,
            combo_step: 5,

            spawn_delay_start_ms: 1000.0,
            spawn_delay_step_ms: 30.0,
            spawn_delay_floor_ms: 400.0,
            spawn_ramp_kills: 5,
            spawn_margin: 20.0,
            companion_chance: 0.2,
            companion_min_level: 2,
            companion_delay_ms: 200.0,

            enemy_base_speed: 120.0,
            enemy_speed_per_level: 15.0,
            enemy_speed_time_step_ms: 10_000.0,
            enemy_speed_time_bonus: 10.0,
            enemy_radius: 15.0,
            elite_chance: 0.2,
            elite_min_level: 2,
            elite_speed_mult: 1.4,
            elite_scale: 1.2,
            elite_health: 2,

            player_speed: 300.0,
            player_radius: 20.0,
            invincibility_ms: 2000.0,

            fire_rate_ms: 700.0,
            rapid_fire_rate_ms: 300.0,
            rapid_fire_duration_ms: 10_000.0,
            projectile_speed: 600.0,
            projectile_radius: 5.0,

            powerup_min_delay_ms: 15_000.0,
            powerup_max_delay_ms: 25_000.0,
            powerup_lifetime_ms: 10_000.0,
            heart_chance: 0.6,
            powerup_radius: 16.0,
            powerup_inset: 100.0,

            boss_first_ms: 60_000.0,
            boss_interval_ms: 60_000.0,
            boss_warning_ms: 6000.0,
            boss_base_health: 15,
            boss_health_per_wave: 5,
            boss_shoot_ms: 1000.0,
            boss_spread: 0.3,
            boss_projectile_speed: 200.0,
            boss_projectile_radius: 8.0,
            boss_radius: 60.0,
            boss_base_gold: 200,
            boss_gold_per_wave: 50,
            boss_kill_bonus: 5,
            boss_cleanup_ms: 500.0,
            boss_drop_delay_ms: 1000.0,
            boss_entry_ms: 2000.0,
            boss_patrol_ms: 2000.0,
            boss_hover_y: 150.0,

            interstitial_interval_ms: 180_000.0,
            continue_min_kills: 10,
        }
    }
}

impl Tuning {
    /// Parse a JSON override document on top of the defaults
    pub fn from_json(json: &str) -> GameResult<Self> {
        serde_json::from_str(json).map_err(|e| GameError::InvalidTuning {
            reason: e.to_string(),
        })
    }

    /// Boss health for a given wave (`15 + 5 * wave` by default)
    pub fn boss_health(&self, wave: u32) -> u32 {
        self.boss_base_health + self.boss_health_per_wave * wave
    }

    /// Gold for defeating the boss of a given wave (`200 + 50 * wave` by default)
    pub fn boss_gold(&self, wave: u32) -> u64 {
        self.boss_base_gold + self.boss_gold_per_wave * wave as u64
    }

    /// Enemy base speed for a profile level and elapsed session time
    pub fn enemy_speed(&self, level: u32, elapsed_ms: f64) -> f32 {
        let time_steps = (elapsed_ms / self.enemy_speed_time_step_ms).floor() as f32;
        self.enemy_base_speed
            + level as f32 * self.enemy_speed_per_level
            + time_steps * self.enemy_speed_time_bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boss_health_formula() {
        let tuning = Tuning::default();
        assert_eq!(tuning.boss_health(1), 20);
        assert_eq!(tuning.boss_health(3), 30);
    }

    #[test]
    fn test_boss_gold_formula() {
        let tuning = Tuning::default();
        assert_eq!(tuning.boss_gold(1), 250);
        assert_eq!(tuning.boss_gold(2), 300);
    }

    #[test]
    fn test_enemy_speed_ramp() {
        let tuning = Tuning::default();
        assert_eq!(tuning.enemy_speed(1, 0.0), 135.0);
        assert_eq!(tuning.enemy_speed(1, 9_999.0), 135.0);
        assert_eq!(tuning.enemy_speed(1, 10_000.0), 145.0);
        assert_eq!(tuning.enemy_speed(3, 25_000.0), 120.0 + 45.0 + 20.0);
    }

    #[test]
    fn test_partial_override() {
        let tuning = Tuning::from_json(r#"{ "unlockPrice": 250, "bossWarningMs": 1000 }"#)
            .unwrap();
        assert_eq!(tuning.unlock_price, 250);
        assert_eq!(tuning.boss_warning_ms, 1000.0);
        assert_eq!(tuning.fire_rate_ms, 700.0);
    }

    #[test]
    fn test_bad_override_is_error() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(GameError::InvalidTuning { .. })
        ));
    }
}
