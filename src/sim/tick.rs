//! Session simulation tick
//!
//! Advances a session by a caller-supplied delta. The order of the steps
//! inside a tick is fixed, so the same seed and the same deltas replay the
//! same session.

use glam::Vec2;
use rand::Rng;

use super::boss::{Boss, BossPhase};
use super::collision::{circles_overlap, clamp_to_world, first_overlap};
use super::entities::{EnemyKind, PowerUpKind, ShotTarget};
use super::state::{
    DamageSource, Deferred, GameEvent, GamePhase, PowerUpEffect, Session, random_power_up_delay,
};
use crate::consts::{OFFSCREEN_MARGIN, WORLD_CENTER, WORLD_HEIGHT, WORLD_WIDTH};
use crate::platform::InputState;
use crate::progression::{PlayerProfile, level_up_due};

/// Autopilot flees threats closer than this
const AUTOPILOT_DANGER: f32 = 150.0;
/// Autopilot ignores heading components smaller than this
const AUTOPILOT_DEADZONE: f32 = 8.0;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Merged key and on-screen button state
    pub movement: InputState,
    /// Idle/demo mode - AI steers the player
    pub autopilot: bool,
}

/// Advance the session by `dt_ms` of simulation time
pub fn tick(session: &mut Session, profile: &mut PlayerProfile, input: &TickInput, dt_ms: f64) {
    if !session.is_running() || dt_ms <= 0.0 {
        return;
    }

    session.elapsed_ms += dt_ms;
    let now = session.elapsed_ms;
    let dt = (dt_ms / 1000.0) as f32;

    run_deferred(session, now);
    expire_effects(session, now);

    // Movement
    let movement = if input.autopilot {
        autopilot(session)
    } else {
        input.movement
    };
    move_player(session, movement, dt);
    move_enemies(session, profile.level, dt);
    session.entities.move_projectiles(dt, OFFSCREEN_MARGIN);
    if let BossPhase::Active(boss) = &mut session.boss {
        boss.update(dt_ms, &mut session.rng, &session.tuning);
    }

    run_timers(session, profile.level, dt_ms);

    resolve_collisions(session, profile);
    if session.phase == GamePhase::GameOver {
        return;
    }

    for id in session.entities.expire_power_ups(now) {
        session.emit(GameEvent::PowerUpExpired { id });
    }
    if session.combo.decay(now, session.tuning.combo_window_ms) {
        session.emit(GameEvent::ComboExpired);
    }

    check_level_up(session, profile);
    ramp_spawn_delay(session);
    check_boss_trigger(session, now);
}

// ============================================================================
// Scheduled actions and timers
// ============================================================================

fn run_deferred(session: &mut Session, now: f64) {
    for action in session.deferred.take_due(now) {
        if !session.is_running() {
            break;
        }
        match action {
            Deferred::CompanionSpawn { pos } => {
                // Companions rolled before a boss warning never join the fight
                if session.boss.is_inactive() {
                    spawn_enemy_at(session, EnemyKind::Normal, pos);
                }
            }
            Deferred::BossArrive => arrive_boss(session),
            Deferred::BossCleanup => cleanup_boss(session, now),
            Deferred::GuaranteedPowerUp => spawn_power_up(session, now),
        }
    }
}

fn expire_effects(session: &mut Session, now: f64) {
    let Some(until) = session.rapid_fire_until_ms else {
        return;
    };
    if now < until {
        return;
    }
    session.rapid_fire_until_ms = None;
    session.fire_rate_ms = session.tuning.fire_rate_ms;
    session.timers.fire.set_delay(session.fire_rate_ms);
    session.emit(GameEvent::RapidFireEnded);
}

fn run_timers(session: &mut Session, level: u32, dt_ms: f64) {
    let now = session.elapsed_ms;

    // Paused while a boss encounter is underway
    let spawns = session.timers.spawn.advance(dt_ms);
    for _ in 0..spawns {
        if !session.is_running() {
            return;
        }
        spawn_enemy_wave(session, level);
    }

    let shots = session.timers.fire.advance(dt_ms);
    for _ in 0..shots {
        auto_fire(session);
    }

    if session.timers.power_up.advance(dt_ms) > 0 {
        spawn_power_up(session, now);
        let delay = random_power_up_delay(&mut session.rng, &session.tuning);
        session.timers.power_up.set_delay(delay);
    }

    if matches!(session.boss, BossPhase::Active(_)) {
        let volleys = session.timers.boss_shoot.advance(dt_ms);
        for _ in 0..volleys {
            boss_volley(session);
        }
    }

    let interstitials = session.timers.interstitial.advance(dt_ms);
    for _ in 0..interstitials {
        session.emit(GameEvent::InterstitialDue);
    }
}

// ============================================================================
// Movement
// ============================================================================

fn move_player(session: &mut Session, movement: InputState, dt: f32) {
    let player = &mut session.player;
    player.vel = movement.axis() * session.tuning.player_speed;
    player.pos = clamp_to_world(player.pos + player.vel * dt, player.radius);
}

fn move_enemies(session: &mut Session, level: u32, dt: f32) {
    let ramp = session.tuning.enemy_speed(level, session.elapsed_ms);
    session.enemy_speed = session.enemy_speed.max(ramp);

    let target = session.player.pos;
    let speed = session.enemy_speed;
    for enemy in &mut session.entities.enemies {
        enemy.pursue(target, speed, dt);
    }
}

/// Demo steering: run from the closest threat, otherwise go for the nearest
/// power-up, otherwise drift back to the middle
fn autopilot(session: &Session) -> InputState {
    let pos = session.player.pos;
    let by_distance = |a: &Vec2, b: &Vec2| a.distance_squared(pos).total_cmp(&b.distance_squared(pos));

    let threat = session
        .entities
        .enemies
        .iter()
        .map(|e| e.pos)
        .chain(session.entities.boss_projectiles.iter().map(|p| p.pos))
        .filter(|t| t.distance(pos) < AUTOPILOT_DANGER)
        .min_by(by_distance);

    let heading = match threat {
        // Bias toward the middle so the player is not pinned to a wall
        Some(t) => (pos - t).normalize_or_zero() * 100.0 + (WORLD_CENTER - pos) * 0.25,
        None => {
            session
                .entities
                .power_ups
                .iter()
                .map(|p| p.pos)
                .min_by(by_distance)
                .unwrap_or(WORLD_CENTER)
                - pos
        }
    };

    InputState {
        left: heading.x < -AUTOPILOT_DEADZONE,
        right: heading.x > AUTOPILOT_DEADZONE,
        up: heading.y < -AUTOPILOT_DEADZONE,
        down: heading.y > AUTOPILOT_DEADZONE,
    }
}

// ============================================================================
// Spawning
// ============================================================================

fn spawn_enemy_wave(session: &mut Session, level: u32) {
    let now = session.elapsed_ms;
    let margin = session.tuning.spawn_margin;
    let rng = &mut session.rng;

    // Random point on a random edge, plus its mirror on the same edge
    let (pos, mirrored) = match rng.random_range(0..4u8) {
        0 => {
            let x = rng.random_range(0.0..WORLD_WIDTH);
            (Vec2::new(x, -margin), Vec2::new(WORLD_WIDTH - x, -margin))
        }
        1 => {
            let y = rng.random_range(0.0..WORLD_HEIGHT);
            (
                Vec2::new(WORLD_WIDTH + margin, y),
                Vec2::new(WORLD_WIDTH + margin, WORLD_HEIGHT - y),
            )
        }
        2 => {
            let x = rng.random_range(0.0..WORLD_WIDTH);
            (
                Vec2::new(x, WORLD_HEIGHT + margin),
                Vec2::new(WORLD_WIDTH - x, WORLD_HEIGHT + margin),
            )
        }
        _ => {
            let y = rng.random_range(0.0..WORLD_HEIGHT);
            (Vec2::new(-margin, y), Vec2::new(-margin, WORLD_HEIGHT - y))
        }
    };

    let elite = level >= session.tuning.elite_min_level && roll(rng, session.tuning.elite_chance);
    let companion =
        level >= session.tuning.companion_min_level && roll(rng, session.tuning.companion_chance);

    let kind = if elite {
        EnemyKind::Elite {
            health: session.tuning.elite_health,
        }
    } else {
        EnemyKind::Normal
    };
    spawn_enemy_at(session, kind, pos);

    if companion {
        let delay = session.tuning.companion_delay_ms;
        session
            .deferred
            .schedule(now, delay, Deferred::CompanionSpawn { pos: mirrored });
    }
}

fn spawn_enemy_at(session: &mut Session, kind: EnemyKind, pos: Vec2) {
    let id = session.entities.spawn_enemy(kind, pos, &session.tuning);
    let elite = matches!(kind, EnemyKind::Elite { .. });
    log::debug!("Enemy {} spawned at ({:.0}, {:.0}) elite={}", id, pos.x, pos.y, elite);
    session.emit(GameEvent::EnemySpawned { id, elite });
}

fn spawn_power_up(session: &mut Session, now: f64) {
    let inset = session.tuning.powerup_inset;
    let rng = &mut session.rng;
    let pos = Vec2::new(
        random_between(rng, inset, WORLD_WIDTH - inset),
        random_between(rng, inset, WORLD_HEIGHT - inset),
    );
    let kind = if roll(rng, session.tuning.heart_chance) {
        PowerUpKind::Heart
    } else {
        PowerUpKind::Speed
    };

    let id = session
        .entities
        .spawn_power_up(kind, pos, now, &session.tuning);
    log::debug!("Power-up {:?} spawned at ({:.0}, {:.0})", kind, pos.x, pos.y);
    session.emit(GameEvent::PowerUpSpawned { id, kind });
}

/// Fire one shot: the boss takes priority, otherwise the nearest enemy
fn auto_fire(session: &mut Session) {
    let origin = session.player.pos;
    let aim = match &session.boss {
        BossPhase::Active(boss) => Some((boss.pos, ShotTarget::Boss)),
        _ => session
            .entities
            .nearest_enemy(origin)
            .map(|e| (e.pos, ShotTarget::Enemy)),
    };
    let Some((target_pos, target)) = aim else {
        return;
    };
    let Some(dir) = (target_pos - origin).try_normalize() else {
        return;
    };
    let vel = dir * session.tuning.projectile_speed;
    session
        .entities
        .spawn_projectile(origin, vel, target, &session.tuning);
}

fn boss_volley(session: &mut Session) {
    let Some(boss) = session.boss.boss() else {
        return;
    };
    let origin = boss.pos;
    let shots = boss.volley(session.player.pos, &session.tuning);
    for vel in shots {
        session
            .entities
            .spawn_boss_projectile(origin, vel, &session.tuning);
    }
}

// ============================================================================
// Collisions
// ============================================================================

/// Resolve hits in priority order. A shot is consumed by its first hit.
fn resolve_collisions(session: &mut Session, profile: &mut PlayerProfile) {
    let now = session.elapsed_ms;
    shots_vs_boss(session, profile, now);
    shots_vs_enemies(session, profile, now);
    player_vs_enemies(session);
    player_vs_boss_shots(session);
    collect_power_ups(session, profile, now);
}

fn shots_vs_boss(session: &mut Session, profile: &mut PlayerProfile, now: f64) {
    let BossPhase::Active(boss) = &mut session.boss else {
        return;
    };

    let mut hits = Vec::new();
    let mut defeated = false;
    session.entities.projectiles.retain(|shot| {
        if defeated
            || shot.target != ShotTarget::Boss
            || !circles_overlap(shot.pos, shot.radius, boss.pos, boss.radius)
        {
            return true;
        }
        defeated = boss.hit();
        hits.push(GameEvent::BossHit {
            health: boss.health,
            max_health: boss.max_health,
        });
        false
    });
    let wave = boss.wave;

    for event in hits {
        session.emit(event);
    }
    if defeated {
        defeat_boss(session, profile, wave, now);
    }
}

fn shots_vs_enemies(session: &mut Session, profile: &mut PlayerProfile, now: f64) {
    let mut i = 0;
    while i < session.entities.projectiles.len() {
        let shot = &session.entities.projectiles[i];
        let hit = first_overlap(
            shot.pos,
            shot.radius,
            session.entities.enemies.iter().map(|e| (e.pos, e.radius)),
        );
        match hit {
            Some(index) => {
                session.entities.projectiles.remove(i);
                damage_enemy(session, profile, index, now);
            }
            None => i += 1,
        }
    }
}

/// Elites lose one health per hit and die on the last one
fn damage_enemy(session: &mut Session, profile: &mut PlayerProfile, index: usize, now: f64) {
    let enemy = &mut session.entities.enemies[index];
    let survived = match &mut enemy.kind {
        EnemyKind::Elite { health } => {
            if *health > 1 {
                *health -= 1;
                Some(*health)
            } else {
                None
            }
        }
        EnemyKind::Normal => None,
    };
    if let Some(health_left) = survived {
        let id = enemy.id;
        session.emit(GameEvent::EliteHit { id, health_left });
        return;
    }

    let enemy = session.entities.enemies.remove(index);
    let combo = session
        .combo
        .register_kill(now, session.tuning.combo_window_ms);
    let gold = profile.award_kill(enemy.base_gold(&session.tuning), &session.combo, &session.tuning);
    session.current_kills += 1;
    session.gold_earned += gold;
    session.emit(GameEvent::EnemyKilled {
        id: enemy.id,
        gold,
        combo,
        elite: enemy.is_elite(),
    });
}

fn player_vs_enemies(session: &mut Session) {
    if session.is_invincible() {
        return;
    }
    let player = &session.player;
    let hit = first_overlap(
        player.pos,
        player.radius,
        session.entities.enemies.iter().map(|e| (e.pos, e.radius)),
    );
    if let Some(index) = hit {
        let enemy = session.entities.enemies.remove(index);
        damage_player(
            session,
            DamageSource::Enemy {
                elite: enemy.is_elite(),
            },
        );
    }
}

fn player_vs_boss_shots(session: &mut Session) {
    if session.is_invincible() {
        return;
    }
    let player = &session.player;
    let hit = first_overlap(
        player.pos,
        player.radius,
        session
            .entities
            .boss_projectiles
            .iter()
            .map(|p| (p.pos, p.radius)),
    );
    if let Some(index) = hit {
        session.entities.boss_projectiles.remove(index);
        damage_player(session, DamageSource::BossProjectile);
    }
}

/// One life per hit, then a window where nothing else can hurt
fn damage_player(session: &mut Session, source: DamageSource) {
    session.lives = session.lives.saturating_sub(1);
    session.invincible_until_ms = session.elapsed_ms + session.tuning.invincibility_ms;
    session.combo.reset();
    session.emit(GameEvent::PlayerHit {
        lives_left: session.lives,
        source,
    });
    log::debug!("Player hit by {:?}, {} lives left", source, session.lives);

    if session.lives == 0 {
        game_over(session);
    }
}

fn collect_power_ups(session: &mut Session, profile: &mut PlayerProfile, now: f64) {
    let (pos, radius) = (session.player.pos, session.player.radius);
    loop {
        let hit = first_overlap(
            pos,
            radius,
            session.entities.power_ups.iter().map(|p| (p.pos, p.radius)),
        );
        let Some(index) = hit else {
            break;
        };
        let power_up = session.entities.power_ups.remove(index);
        let effect = match power_up.kind {
            PowerUpKind::Heart if session.lives < session.tuning.max_lives => {
                session.lives += 1;
                PowerUpEffect::ExtraLife
            }
            PowerUpKind::Heart => {
                let bonus = session.tuning.heart_bonus_gold;
                profile.add_gold(bonus);
                session.gold_earned += bonus;
                PowerUpEffect::BonusGold(bonus)
            }
            PowerUpKind::Speed => {
                // Collecting again restarts the full duration
                let until_ms = now + session.tuning.rapid_fire_duration_ms;
                session.rapid_fire_until_ms = Some(until_ms);
                session.fire_rate_ms = session.tuning.rapid_fire_rate_ms;
                session.timers.fire.set_delay(session.fire_rate_ms);
                PowerUpEffect::RapidFire { until_ms }
            }
        };
        session.emit(GameEvent::PowerUpCollected {
            kind: power_up.kind,
            effect,
        });
    }
}

// ============================================================================
// Progression, difficulty and the boss cycle
// ============================================================================

/// At most one level per tick
fn check_level_up(session: &mut Session, profile: &mut PlayerProfile) {
    if !level_up_due(session.current_kills, profile.level, &session.tuning) {
        return;
    }

    let up = profile.level_up();
    let life_restored = session.lives < session.tuning.max_lives;
    if life_restored {
        session.lives += 1;
    }
    let ramp = session.tuning.enemy_speed(up.level, session.elapsed_ms);
    session.enemy_speed = session.enemy_speed.max(ramp);

    match up.evolution {
        Some(evolution) => log::info!("Level {}: {}", up.level, evolution.label()),
        None => log::info!("Level {}", up.level),
    }
    session.emit(GameEvent::LevelUp {
        level: up.level,
        evolution: up.evolution,
        life_restored,
    });
}

fn ramp_spawn_delay(session: &mut Session) {
    let delay = Session::spawn_delay_for(&session.tuning, session.current_kills);
    if delay < session.enemy_spawn_delay_ms {
        session.enemy_spawn_delay_ms = delay;
        session.timers.spawn.set_delay(delay);
        log::debug!("Spawn delay now {}ms", delay);
    }
}

fn check_boss_trigger(session: &mut Session, now: f64) {
    if !session.boss.is_inactive() || now < session.next_boss_ms {
        return;
    }

    let warning = session.tuning.boss_warning_ms;
    let cleared = session.entities.clear_enemies();
    session.timers.spawn.pause();
    session.boss = BossPhase::Warning {
        arrives_ms: now + warning,
    };
    session.deferred.schedule(now, warning, Deferred::BossArrive);

    log::info!(
        "Boss wave {} incoming, cleared {} enemies",
        session.boss_wave,
        cleared
    );
    session.emit(GameEvent::BossWarning {
        wave: session.boss_wave,
    });
}

fn arrive_boss(session: &mut Session) {
    if !matches!(session.boss, BossPhase::Warning { .. }) {
        return;
    }
    let boss = Boss::new(session.boss_wave, &session.tuning);
    let (wave, health) = (boss.wave, boss.health);
    session.boss = BossPhase::Active(boss);
    session.timers.boss_shoot.restart();

    log::info!("Boss wave {} arrived with {} health", wave, health);
    session.emit(GameEvent::BossSpawned { wave, health });
}

fn defeat_boss(session: &mut Session, profile: &mut PlayerProfile, wave: u32, now: f64) {
    let gold = session.tuning.boss_gold(wave);
    let bonus_kills = session.tuning.boss_kill_bonus;
    profile.add_gold(gold);
    profile.kill_count += bonus_kills;
    session.current_kills += bonus_kills;
    session.gold_earned += gold;

    session.boss = BossPhase::Defeated;
    session
        .deferred
        .schedule(now, session.tuning.boss_cleanup_ms, Deferred::BossCleanup);
    session.deferred.schedule(
        now,
        session.tuning.boss_drop_delay_ms,
        Deferred::GuaranteedPowerUp,
    );

    log::info!("Boss wave {} defeated (+{} gold)", wave, gold);
    session.emit(GameEvent::BossDefeated { wave, gold });
}

fn cleanup_boss(session: &mut Session, now: f64) {
    if !matches!(session.boss, BossPhase::Defeated) {
        return;
    }
    session.entities.boss_projectiles.clear();
    session.timers.spawn.resume();
    session.boss_wave += 1;
    session.next_boss_ms = now + session.tuning.boss_interval_ms;
    session.boss = BossPhase::Inactive;

    session.emit(GameEvent::BossCleared {
        next_wave: session.boss_wave,
    });
}

fn game_over(session: &mut Session) {
    if session.phase == GamePhase::GameOver {
        return;
    }
    session.phase = GamePhase::GameOver;
    session.entities.clear();
    session.deferred.clear();
    session.boss = BossPhase::Inactive;

    log::info!(
        "Game over after {:.1}s: {} kills, {} gold",
        session.elapsed_ms / 1000.0,
        session.current_kills,
        session.gold_earned
    );
    session.emit(GameEvent::GameOver {
        kills: session.current_kills,
        gold: session.gold_earned,
    });
}

// ============================================================================
// Random helpers
// ============================================================================

fn roll<R: Rng>(rng: &mut R, chance: f64) -> bool {
    rng.random_bool(chance.clamp(0.0, 1.0))
}

/// Uniform in `[lo, hi)`, or `lo` for an empty range
fn random_between<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.random_range(lo..hi)
    } else {
        lo
    }
}
