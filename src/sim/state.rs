//! Session state and core simulation types
//!
//! A [`Session`] is one play from start to game over. It owns every live
//! entity and every timer, so dropping or cancelling it leaves nothing that
//! can fire later.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::BossPhase;
use super::entities::{Entities, PowerUpKind};
use super::timer::{Schedule, Timer};
use crate::consts::PLAYER_START;
use crate::progression::{Combo, Evolution};
use crate::tuning::Tuning;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Running,
    /// Terminal
    GameOver,
}

/// The player's avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pos: PLAYER_START,
            vel: Vec2::ZERO,
            radius: tuning.player_radius,
        }
    }
}

/// What damaged the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    Enemy { elite: bool },
    BossProjectile,
}

/// What collecting a power-up did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PowerUpEffect {
    ExtraLife,
    /// Heart collected at full health
    BonusGold(u64),
    RapidFire { until_ms: f64 },
}

/// Something that happened during a tick, for the presentation layer and
/// the owning context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    EnemySpawned { id: u32, elite: bool },
    /// Elite survived a hit
    EliteHit { id: u32, health_left: u8 },
    EnemyKilled { id: u32, gold: u64, combo: u32, elite: bool },
    PlayerHit { lives_left: u8, source: DamageSource },
    LevelUp {
        level: u32,
        evolution: Option<Evolution>,
        life_restored: bool,
    },
    /// Live combo ran out without a kill
    ComboExpired,
    PowerUpSpawned { id: u32, kind: PowerUpKind },
    PowerUpCollected { kind: PowerUpKind, effect: PowerUpEffect },
    PowerUpExpired { id: u32 },
    RapidFireEnded,
    BossWarning { wave: u32 },
    BossSpawned { wave: u32, health: u32 },
    BossHit { health: u32, max_health: u32 },
    BossDefeated { wave: u32, gold: u64 },
    /// Cleanup done, normal spawning resumed
    BossCleared { next_wave: u32 },
    InterstitialDue,
    GameOver { kills: u64, gold: u64 },
}

impl GameEvent {
    /// Whether the event changed the persistent profile
    pub fn mutates_profile(&self) -> bool {
        matches!(
            self,
            GameEvent::EnemyKilled { .. }
                | GameEvent::LevelUp { .. }
                | GameEvent::PowerUpCollected {
                    effect: PowerUpEffect::BonusGold(_),
                    ..
                }
                | GameEvent::BossDefeated { .. }
                | GameEvent::GameOver { .. }
        )
    }
}

/// One-shot actions scheduled relative to simulation time
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Deferred {
    CompanionSpawn { pos: Vec2 },
    BossArrive,
    BossCleanup,
    GuaranteedPowerUp,
}

/// Every repeating cadence of a session
#[derive(Debug, Clone)]
pub(crate) struct SessionTimers {
    pub spawn: Timer,
    pub fire: Timer,
    pub power_up: Timer,
    pub boss_shoot: Timer,
    pub interstitial: Timer,
}

/// What a finished session contributed, reported after game over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub kills: u64,
    pub gold_earned: u64,
    pub level: u32,
    pub elapsed_ms: f64,
    pub new_high_score: bool,
    /// 1-based leaderboard rank, `None` when outside the retained entries
    pub rank: Option<usize>,
    pub continue_offered: bool,
}

/// One play session (ephemeral)
#[derive(Debug, Clone)]
pub struct Session {
    /// Seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Cleared when the owner discards the session
    live: bool,
    pub elapsed_ms: f64,
    pub player: Player,
    pub lives: u8,
    pub current_kills: u64,
    /// Gold earned this session, kills and bonuses
    pub gold_earned: u64,
    pub combo: Combo,
    /// Never increases within a session
    pub enemy_spawn_delay_ms: f64,
    /// Never decreases within a session
    pub enemy_speed: f32,
    pub invincible_until_ms: f64,
    pub rapid_fire_until_ms: Option<f64>,
    pub fire_rate_ms: f64,
    pub boss: BossPhase,
    /// Starts at 1, +1 per defeated boss
    pub boss_wave: u32,
    pub next_boss_ms: f64,
    pub entities: Entities,
    pub(crate) timers: SessionTimers,
    pub(crate) deferred: Schedule<Deferred>,
    events: Vec<GameEvent>,
}

impl Session {
    /// Start a session for a player at `level`
    pub fn new(seed: u64, tuning: Tuning, level: u32) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let power_up_delay = random_power_up_delay(&mut rng, &tuning);
        let timers = SessionTimers {
            spawn: Timer::repeating(tuning.spawn_delay_start_ms),
            fire: Timer::repeating(tuning.fire_rate_ms),
            power_up: Timer::repeating(power_up_delay),
            boss_shoot: Timer::repeating(tuning.boss_shoot_ms),
            interstitial: Timer::repeating(tuning.interstitial_interval_ms),
        };

        log::info!("Session started (seed {}, level {})", seed, level);

        Self {
            seed,
            rng,
            phase: GamePhase::Running,
            live: true,
            elapsed_ms: 0.0,
            player: Player::new(&tuning),
            lives: tuning.max_lives,
            current_kills: 0,
            gold_earned: 0,
            combo: Combo::default(),
            enemy_spawn_delay_ms: tuning.spawn_delay_start_ms,
            enemy_speed: tuning.enemy_speed(level, 0.0),
            invincible_until_ms: 0.0,
            rapid_fire_until_ms: None,
            fire_rate_ms: tuning.fire_rate_ms,
            boss: BossPhase::Inactive,
            boss_wave: 1,
            next_boss_ms: tuning.boss_first_ms,
            entities: Entities::new(),
            timers,
            deferred: Schedule::new(),
            events: Vec::new(),
            tuning,
        }
    }

    pub fn is_running(&self) -> bool {
        self.live && self.phase == GamePhase::Running
    }

    /// Whether the owner still holds this session
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Discard the session: pending actions are dropped and nothing fires
    /// again, even if `tick` keeps being called
    pub fn cancel(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        self.deferred.clear();
        self.entities.clear();
        self.boss = BossPhase::Inactive;
        log::debug!("Session {} cancelled", self.seed);
    }

    pub fn is_invincible(&self) -> bool {
        self.elapsed_ms < self.invincible_until_ms
    }

    /// Blink state of the player while invincible (150ms phases)
    pub fn player_flash_visible(&self) -> bool {
        if !self.is_invincible() {
            return true;
        }
        let since_hit = self.elapsed_ms - (self.invincible_until_ms - self.tuning.invincibility_ms);
        (since_hit / 150.0).floor() as u64 % 2 == 1
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Spawn delay for a session kill count: one step off per ramp, floored
    pub fn spawn_delay_for(tuning: &Tuning, kills: u64) -> f64 {
        let steps = (kills / tuning.spawn_ramp_kills.max(1)) as f64;
        (tuning.spawn_delay_start_ms - steps * tuning.spawn_delay_step_ms)
            .max(tuning.spawn_delay_floor_ms)
    }
}

/// Uniform in `[min, max)` of the power-up cadence
pub(crate) fn random_power_up_delay<R: Rng>(rng: &mut R, tuning: &Tuning) -> f64 {
    if tuning.powerup_max_delay_ms > tuning.powerup_min_delay_ms {
        rng.random_range(tuning.powerup_min_delay_ms..tuning.powerup_max_delay_ms)
    } else {
        tuning.powerup_min_delay_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new(7, Tuning::default(), 1);
        assert!(session.is_running());
        assert_eq!(session.lives, 3);
        assert_eq!(session.boss_wave, 1);
        assert_eq!(session.next_boss_ms, 60_000.0);
        assert_eq!(session.enemy_spawn_delay_ms, 1000.0);
        assert_eq!(session.enemy_speed, 135.0);
        assert_eq!(session.fire_rate_ms, 700.0);
        assert_eq!(session.player.pos, PLAYER_START);
        let delay = session.timers.power_up.delay();
        assert!((15_000.0..25_000.0).contains(&delay));
    }

    #[test]
    fn test_spawn_delay_ramp() {
        let tuning = Tuning::default();
        assert_eq!(Session::spawn_delay_for(&tuning, 0), 1000.0);
        assert_eq!(Session::spawn_delay_for(&tuning, 4), 1000.0);
        assert_eq!(Session::spawn_delay_for(&tuning, 5), 970.0);
        assert_eq!(Session::spawn_delay_for(&tuning, 52), 700.0);
        assert_eq!(Session::spawn_delay_for(&tuning, 10_000), 400.0);
    }

    #[test]
    fn test_cancel_is_final() {
        let mut session = Session::new(1, Tuning::default(), 1);
        session.deferred.schedule(0.0, 10.0, Deferred::BossArrive);
        session.cancel();
        assert!(!session.is_live());
        assert!(!session.is_running());
        assert!(session.deferred.is_empty());
    }

    #[test]
    fn test_flash_blinks_while_invincible() {
        let mut session = Session::new(1, Tuning::default(), 1);
        assert!(session.player_flash_visible());
        session.elapsed_ms = 1000.0;
        session.invincible_until_ms = 3000.0;
        assert!(!session.player_flash_visible());
        session.elapsed_ms = 1200.0;
        assert!(session.player_flash_visible());
        session.elapsed_ms = 3000.0;
        assert!(session.player_flash_visible());
    }

    #[test]
    fn test_profile_mutating_events() {
        assert!(GameEvent::BossDefeated { wave: 1, gold: 250 }.mutates_profile());
        assert!(
            GameEvent::PowerUpCollected {
                kind: PowerUpKind::Heart,
                effect: PowerUpEffect::BonusGold(100)
            }
            .mutates_profile()
        );
        assert!(
            !GameEvent::PowerUpCollected {
                kind: PowerUpKind::Heart,
                effect: PowerUpEffect::ExtraLife
            }
            .mutates_profile()
        );
        assert!(!GameEvent::InterstitialDue.mutates_profile());
    }
}
