//! Live entities of a session
//!
//! Enemies, player shots, boss shots and power-ups, each a tagged type that
//! carries only the fields its variant needs. The boss is a singleton and
//! lives in [`super::boss`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::tuning::Tuning;

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Normal,
    /// Takes `health` more hits to destroy
    Elite { health: u8 },
}

/// A homing enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Multiplier over the session's current enemy speed
    pub speed_mult: f32,
    pub radius: f32,
}

impl Enemy {
    pub fn is_elite(&self) -> bool {
        matches!(self.kind, EnemyKind::Elite { .. })
    }

    /// Gold before the combo multiplier
    pub fn base_gold(&self, tuning: &Tuning) -> u64 {
        match self.kind {
            EnemyKind::Normal => tuning.normal_gold,
            EnemyKind::Elite { .. } => tuning.elite_gold,
        }
    }

    /// Steer straight at `target` and move
    pub fn pursue(&mut self, target: Vec2, base_speed: f32, dt: f32) {
        let dir = (target - self.pos).normalize_or_zero();
        self.vel = dir * base_speed * self.speed_mult;
        self.pos += self.vel * dt;
    }
}

/// What a player shot was aimed at when fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotTarget {
    Enemy,
    /// Only shots fired at the boss can damage it
    Boss,
}

/// Auto-fire projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub target: ShotTarget,
}

/// Boss volley projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossProjectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// +1 life, or bonus gold at full health
    Heart,
    /// Rapid fire for a while
    Speed,
}

/// A collectible power-up. Removed when collected or when it expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub radius: f32,
    pub expires_ms: f64,
}

/// All live entities except the player and the boss
#[derive(Debug, Clone, Default)]
pub struct Entities {
    /// Kept in spawn order
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub boss_projectiles: Vec<BossProjectile>,
    pub power_ups: Vec<PowerUp>,
    next_id: u32,
}

impl Entities {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2, tuning: &Tuning) -> u32 {
        let id = self.next_entity_id();
        let (speed_mult, radius) = match kind {
            EnemyKind::Normal => (1.0, tuning.enemy_radius),
            EnemyKind::Elite { .. } => (
                tuning.elite_speed_mult,
                tuning.enemy_radius * tuning.elite_scale,
            ),
        };
        self.enemies.push(Enemy {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            speed_mult,
            radius,
        });
        id
    }

    pub fn spawn_projectile(
        &mut self,
        pos: Vec2,
        vel: Vec2,
        target: ShotTarget,
        tuning: &Tuning,
    ) -> u32 {
        let id = self.next_entity_id();
        self.projectiles.push(Projectile {
            id,
            pos,
            vel,
            radius: tuning.projectile_radius,
            target,
        });
        id
    }

    pub fn spawn_boss_projectile(&mut self, pos: Vec2, vel: Vec2, tuning: &Tuning) -> u32 {
        let id = self.next_entity_id();
        self.boss_projectiles.push(BossProjectile {
            id,
            pos,
            vel,
            radius: tuning.boss_projectile_radius,
        });
        id
    }

    pub fn spawn_power_up(
        &mut self,
        kind: PowerUpKind,
        pos: Vec2,
        now_ms: f64,
        tuning: &Tuning,
    ) -> u32 {
        let id = self.next_entity_id();
        self.power_ups.push(PowerUp {
            id,
            kind,
            pos,
            radius: tuning.powerup_radius,
            expires_ms: now_ms + tuning.powerup_lifetime_ms,
        });
        id
    }

    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    /// Nearest enemy by Euclidean distance; ties go to the earliest spawned
    pub fn nearest_enemy(&self, from: Vec2) -> Option<&Enemy> {
        let mut best: Option<(&Enemy, f32)> = None;
        for enemy in &self.enemies {
            let dist = enemy.pos.distance_squared(from);
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((enemy, dist)),
            }
        }
        best.map(|(e, _)| e)
    }

    /// Move both kinds of shots and drop the ones that left the screen
    pub fn move_projectiles(&mut self, dt: f32, margin: f32) {
        for p in &mut self.projectiles {
            p.pos += p.vel * dt;
        }
        for p in &mut self.boss_projectiles {
            p.pos += p.vel * dt;
        }
        self.projectiles.retain(|p| on_screen(p.pos, margin));
        self.boss_projectiles.retain(|p| on_screen(p.pos, margin));
    }

    /// Remove power-ups whose lifetime ran out, returning their ids
    pub fn expire_power_ups(&mut self, now_ms: f64) -> Vec<u32> {
        let mut expired = Vec::new();
        self.power_ups.retain(|p| {
            let alive = p.expires_ms > now_ms;
            if !alive {
                expired.push(p.id);
            }
            alive
        });
        expired
    }

    /// Remove every enemy, returning how many there were
    pub fn clear_enemies(&mut self) -> usize {
        let count = self.enemies.len();
        self.enemies.clear();
        count
    }

    /// Discard everything (game over, session teardown)
    pub fn clear(&mut self) {
        self.enemies.clear();
        self.projectiles.clear();
        self.boss_projectiles.clear();
        self.power_ups.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
            && self.projectiles.is_empty()
            && self.boss_projectiles.is_empty()
            && self.power_ups.is_empty()
    }
}

/// Whether a point is within the world expanded by `margin`
pub fn on_screen(pos: Vec2, margin: f32) -> bool {
    pos.x >= -margin
        && pos.x <= WORLD_WIDTH + margin
        && pos.y >= -margin
        && pos.y <= WORLD_HEIGHT + margin
}
