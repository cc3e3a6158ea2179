//! Boss encounter
//!
//! One boss per wave. The session walks it through
//! `Inactive -> Warning -> Active -> Defeated -> Inactive`; this module owns
//! the boss body itself: health, entry and patrol movement, and volley aim.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{BOSS_ENTRY, BOSS_PATROL_INSET, WORLD_WIDTH};
use crate::tuning::Tuning;

/// Boss sub-state of a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum BossPhase {
    /// Normal spawning, waiting for the next boss time
    #[default]
    Inactive,
    /// Enemies cleared, boss arrives at `arrives_ms`
    Warning { arrives_ms: f64 },
    Active(Boss),
    /// Killed, waiting for cleanup
    Defeated,
}

impl BossPhase {
    pub fn is_inactive(&self) -> bool {
        matches!(self, BossPhase::Inactive)
    }

    pub fn boss(&self) -> Option<&Boss> {
        match self {
            BossPhase::Active(boss) => Some(boss),
            _ => None,
        }
    }
}

/// The boss body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub wave: u32,
    pub health: u32,
    pub max_health: u32,
    pub pos: Vec2,
    pub radius: f32,
    /// Current movement leg
    leg_from: Vec2,
    leg_to: Vec2,
    leg_elapsed_ms: f64,
    leg_ms: f64,
    /// Still descending into the arena
    pub entering: bool,
}

impl Boss {
    /// Spawn above the screen, heading for the hover line
    pub fn new(wave: u32, tuning: &Tuning) -> Self {
        let health = tuning.boss_health(wave);
        Self {
            wave,
            health,
            max_health: health,
            pos: BOSS_ENTRY,
            radius: tuning.boss_radius,
            leg_from: BOSS_ENTRY,
            leg_to: Vec2::new(BOSS_ENTRY.x, tuning.boss_hover_y),
            leg_elapsed_ms: 0.0,
            leg_ms: tuning.boss_entry_ms,
            entering: true,
        }
    }

    /// Advance movement. After the entry descent the boss patrols between
    /// random x positions on the hover line.
    pub fn update<R: Rng>(&mut self, dt_ms: f64, rng: &mut R, tuning: &Tuning) {
        self.leg_elapsed_ms += dt_ms;
        let t = (self.leg_elapsed_ms / self.leg_ms).min(1.0) as f32;
        self.pos = self.leg_from.lerp(self.leg_to, smoothstep(t));
        if t < 1.0 {
            return;
        }

        self.entering = false;
        let x = rng.random_range(BOSS_PATROL_INSET..WORLD_WIDTH - BOSS_PATROL_INSET);
        self.leg_from = self.pos;
        self.leg_to = Vec2::new(x, tuning.boss_hover_y);
        self.leg_elapsed_ms = 0.0;
        self.leg_ms = tuning.boss_patrol_ms;
    }

    /// Take one hit, returns true when this hit killed the boss
    pub fn hit(&mut self) -> bool {
        self.health = self.health.saturating_sub(1);
        self.health == 0
    }

    /// Velocities of a volley aimed at `target`, offset by -spread, 0, +spread
    pub fn volley(&self, target: Vec2, tuning: &Tuning) -> [Vec2; 3] {
        let bearing = target - self.pos;
        let angle = bearing.y.atan2(bearing.x);
        [-1.0, 0.0, 1.0]
            .map(|k: f32| Vec2::from_angle(angle + k * tuning.boss_spread) * tuning.boss_projectile_speed)
    }
}

/// Ease in-out for movement legs
#[inline]
fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_boss_health_by_wave() {
        let tuning = Tuning::default();
        let boss = Boss::new(1, &tuning);
        assert_eq!(boss.health, 20);
        assert_eq!(boss.max_health, 20);
        assert_eq!(Boss::new(3, &tuning).health, 30);
    }

    #[test]
    fn test_hits_until_defeat() {
        let tuning = Tuning::default();
        let mut boss = Boss::new(1, &tuning);
        for _ in 0..19 {
            assert!(!boss.hit());
        }
        assert!(boss.hit());
        assert_eq!(boss.health, 0);
        // Extra hits never underflow
        assert!(boss.hit());
    }

    #[test]
    fn test_entry_then_patrol() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut boss = Boss::new(1, &tuning);
        assert_eq!(boss.pos, BOSS_ENTRY);

        boss.update(1000.0, &mut rng, &tuning);
        assert!(boss.entering);
        assert!(boss.pos.y > BOSS_ENTRY.y && boss.pos.y < tuning.boss_hover_y);

        boss.update(1000.0, &mut rng, &tuning);
        assert!(!boss.entering);
        assert_eq!(boss.pos, Vec2::new(BOSS_ENTRY.x, tuning.boss_hover_y));

        for _ in 0..50 {
            boss.update(250.0, &mut rng, &tuning);
            assert_eq!(boss.pos.y, tuning.boss_hover_y);
            assert!(boss.pos.x >= BOSS_PATROL_INSET);
            assert!(boss.pos.x <= WORLD_WIDTH - BOSS_PATROL_INSET);
        }
    }

    #[test]
    fn test_volley_spread() {
        let tuning = Tuning::default();
        let mut boss = Boss::new(1, &tuning);
        boss.pos = Vec2::new(400.0, 150.0);
        let shots = boss.volley(Vec2::new(400.0, 450.0), &tuning);

        // Middle shot straight down at the target
        assert!((shots[1] - Vec2::new(0.0, 200.0)).length() < 1e-3);
        for shot in &shots {
            assert!((shot.length() - 200.0).abs() < 1e-3);
        }
        let left = shots[0].y.atan2(shots[0].x);
        let right = shots[2].y.atan2(shots[2].x);
        assert!((right - left - 0.6).abs() < 1e-4);
    }
}
