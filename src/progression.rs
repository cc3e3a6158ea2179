//! Player progression and gold economy
//!
//! The persistent [`PlayerProfile`], the kill combo, level thresholds and the
//! evolution tiers a player passes through while levelling.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};
use crate::tuning::Tuning;

/// Persistent player record, stored as a JSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerProfile {
    /// Display name, also the leaderboard key
    #[serde(alias = "playerName")]
    pub name: String,
    pub gold: u64,
    /// Never decreases within a profile
    pub level: u32,
    /// Card unlock (charged once)
    pub unlocked: bool,
    /// Lifetime kills
    pub kill_count: u64,
    /// Best single-session kill count
    pub high_score: u64,
    pub total_gold_earned: u64,
    pub games_played: u32,
    pub achievements: BTreeSet<String>,
    /// Cumulative ranking score, reset externally each month
    pub monthly_score: u64,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self::new("Player", &Tuning::default())
    }
}

impl PlayerProfile {
    pub fn new(name: impl Into<String>, tuning: &Tuning) -> Self {
        Self {
            name: name.into(),
            gold: tuning.starting_gold,
            level: 1,
            unlocked: false,
            kill_count: 0,
            high_score: 0,
            total_gold_earned: 0,
            games_played: 0,
            achievements: BTreeSet::new(),
            monthly_score: 0,
        }
    }

    /// First-run profile named `Player<0..9999>`
    pub fn with_random_name<R: Rng>(rng: &mut R, tuning: &Tuning) -> Self {
        let suffix: u32 = rng.random_range(0..9999);
        Self::new(format!("Player{}", suffix), tuning)
    }

    /// Repair values a hand-edited or legacy blob may carry
    pub fn sanitize(&mut self) {
        if self.level == 0 {
            self.level = 1;
        }
    }

    /// Spend the unlock price once. Repeat calls after a successful unlock
    /// are no-ops and never charge again.
    pub fn unlock_card(&mut self, price: u64) -> GameResult<()> {
        if self.unlocked {
            return Ok(());
        }
        if self.gold < price {
            return Err(GameError::InsufficientFunds {
                needed: price,
                available: self.gold,
            });
        }
        self.gold -= price;
        self.unlocked = true;
        log::info!("Card unlocked for {} gold ({} left)", price, self.gold);
        Ok(())
    }

    /// Credit a kill to the wallet and lifetime counters, returning the gold
    /// awarded. The combo must already include this kill.
    pub fn award_kill(&mut self, base_gold: u64, combo: &Combo, tuning: &Tuning) -> u64 {
        let gold = combo.apply(base_gold, tuning.combo_step);
        self.gold += gold;
        self.kill_count += 1;
        gold
    }

    /// Add gold that is not tied to a regular kill (boss, bonus pickups)
    pub fn add_gold(&mut self, gold: u64) {
        self.gold += gold;
    }

    /// Advance one level, returning the new level and any evolution reached
    pub fn level_up(&mut self) -> LevelUp {
        self.level += 1;
        LevelUp {
            level: self.level,
            evolution: Evolution::for_level(self.level),
        }
    }
}

/// Whether the session's kills have reached the current level's threshold
pub fn level_up_due(current_kills: u64, level: u32, tuning: &Tuning) -> bool {
    current_kills >= kills_for_level(level, tuning)
}

/// Session kills that complete `level`, the XP bar's full width
pub fn kills_for_level(level: u32, tuning: &Tuning) -> u64 {
    level as u64 * tuning.kills_per_level
}

/// Result of a level-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub level: u32,
    pub evolution: Option<Evolution>,
}

/// Evolution tiers announced at fixed levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Evolution {
    Enhanced,
    Advanced,
    Elite,
    Legendary,
}

impl Evolution {
    /// The tier reached exactly at `level`, if any
    pub fn for_level(level: u32) -> Option<Self> {
        match level {
            3 => Some(Evolution::Enhanced),
            5 => Some(Evolution::Advanced),
            7 => Some(Evolution::Elite),
            10 => Some(Evolution::Legendary),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Evolution::Enhanced => "EVOLUTION: ENHANCED!",
            Evolution::Advanced => "EVOLUTION: ADVANCED!",
            Evolution::Elite => "EVOLUTION: ELITE!",
            Evolution::Legendary => "EVOLUTION: LEGENDARY!",
        }
    }
}

/// Rolling kill combo
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Combo {
    pub count: u32,
    last_kill_ms: Option<f64>,
}

impl Combo {
    /// Register a kill at `now_ms`. A kill less than `window_ms` after the
    /// previous one extends the combo, anything else restarts it at 1.
    pub fn register_kill(&mut self, now_ms: f64, window_ms: f64) -> u32 {
        let chained = self
            .last_kill_ms
            .is_some_and(|last| now_ms - last < window_ms);
        self.count = if chained { self.count + 1 } else { 1 };
        self.last_kill_ms = Some(now_ms);
        self.count
    }

    /// Drop the live combo once the window has passed without a kill.
    /// Returns true if it was reset.
    pub fn decay(&mut self, now_ms: f64, window_ms: f64) -> bool {
        match self.last_kill_ms {
            Some(last) if self.count > 0 && now_ms - last > window_ms => {
                self.count = 0;
                true
            }
            _ => false,
        }
    }

    /// Player took damage
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// `1 + floor(count / step) * 0.5`
    pub fn multiplier(&self, step: u32) -> f64 {
        1.0 + (self.count / step.max(1)) as f64 * 0.5
    }

    /// `floor(base * multiplier)` in integer arithmetic
    pub fn apply(&self, base_gold: u64, step: u32) -> u64 {
        let half_steps = 2 + (self.count / step.max(1)) as u64;
        base_gold * half_steps / 2
    }
}
