//! Game context
//!
//! Owns everything that outlives a session: the profile, the leaderboard,
//! their storage and the ad provider. At most one session is live at a
//! time; starting a new one cancels the old one first.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::{GameError, GameResult};
use crate::leaderboard::Leaderboard;
use crate::persistence::ProfileStore;
use crate::platform::ads::ConfirmPrompt;
use crate::platform::{AdOutcome, AdProvider, KeyValueStore, RewardRequest};
use crate::progression::PlayerProfile;
use crate::sim::{GameEvent, GamePhase, Session, SessionSummary, TickInput, tick};
use crate::tuning::Tuning;

/// A rewarded ad that has not resolved after this long counts as unavailable
pub const REWARDED_AD_TIMEOUT_MS: f64 = 30_000.0;

pub struct GameContext {
    pub tuning: Tuning,
    profile: PlayerProfile,
    leaderboard: Leaderboard,
    store: ProfileStore,
    ads: Box<dyn AdProvider>,
    /// Fallback when no rewarded ad can be shown
    confirm: Option<Box<ConfirmPrompt<'static>>>,
    session: Option<Session>,
    pending_continue: Option<RewardRequest>,
    last_summary: Option<SessionSummary>,
    /// Seeds new sessions
    rng: Pcg32,
    /// Time fed through `tick` across sessions, drives ad timeouts
    clock_ms: f64,
}

impl GameContext {
    /// Load profile and leaderboard from `backend`. A first run creates and
    /// saves a fresh profile.
    pub fn load(
        backend: Box<dyn KeyValueStore>,
        ads: Box<dyn AdProvider>,
        tuning: Tuning,
        seed: u64,
    ) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut store = ProfileStore::new(backend);
        let profile = store.load_profile(&mut rng, &tuning);
        let leaderboard = store.load_leaderboard();
        store.flush(&profile, &leaderboard);

        Self {
            tuning,
            profile,
            leaderboard,
            store,
            ads,
            confirm: None,
            session: None,
            pending_continue: None,
            last_summary: None,
            rng,
            clock_ms: 0.0,
        }
    }

    /// Install the yes/no prompt used when a rewarded ad cannot be shown
    pub fn with_confirm_prompt(mut self, prompt: Box<ConfirmPrompt<'static>>) -> Self {
        self.confirm = Some(prompt);
        self
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Summary of the last finished session, until the next one starts
    pub fn last_summary(&self) -> Option<&SessionSummary> {
        self.last_summary.as_ref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.store.is_dirty()
    }

    /// Buy the card unlock
    pub fn unlock_card(&mut self) -> GameResult<()> {
        if self.profile.unlocked {
            return Ok(());
        }
        self.profile.unlock_card(self.tuning.unlock_price)?;
        self.save_profile();
        Ok(())
    }

    /// Start a fresh session, cancelling any existing one first
    pub fn start_session(&mut self) -> GameResult<&Session> {
        if !self.profile.unlocked {
            return Err(GameError::CardLocked);
        }
        self.end_session();
        self.last_summary = None;

        let seed = self.rng.random::<u64>();
        let session = Session::new(seed, self.tuning.clone(), self.profile.level);
        Ok(&*self.session.insert(session))
    }

    /// Leave to the main menu: the session is cancelled and dropped
    pub fn end_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.cancel();
        }
        self.pending_continue = None;
        if self.store.is_dirty() {
            self.store.flush(&self.profile, &self.leaderboard);
        }
    }

    /// Advance the live session. Returns the events it produced, after the
    /// context has persisted and summarized what they imply.
    pub fn tick(&mut self, input: &TickInput, dt_ms: f64) -> Vec<GameEvent> {
        self.clock_ms += dt_ms.max(0.0);
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        tick(session, &mut self.profile, input, dt_ms);
        let events = session.drain_events();

        let mut profile_changed = false;
        let mut game_over = false;
        for event in &events {
            match event {
                GameEvent::InterstitialDue => self.show_interstitial(),
                GameEvent::GameOver { .. } => game_over = true,
                _ => {}
            }
            profile_changed |= event.mutates_profile();
        }

        if game_over {
            self.finish_session();
        } else if profile_changed {
            self.save_profile();
        }
        events
    }

    fn show_interstitial(&mut self) {
        if !self.ads.is_available() {
            log::debug!("Interstitial skipped, no ad provider");
            return;
        }
        if let Err(e) = self.ads.show_interstitial() {
            log::warn!("Interstitial skipped: {}", e);
        }
    }

    /// Fold the finished session into the profile and the leaderboard
    fn finish_session(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.phase != GamePhase::GameOver {
            return;
        }
        let kills = session.current_kills;
        let gold_earned = session.gold_earned;
        let elapsed_ms = session.elapsed_ms;

        let profile = &mut self.profile;
        profile.games_played += 1;
        let new_high_score = kills > profile.high_score;
        if new_high_score {
            profile.high_score = kills;
        }
        profile.monthly_score += kills;
        profile.total_gold_earned += gold_earned;

        let rank = self
            .leaderboard
            .submit(&profile.name, kills, gold_earned, profile.level);
        self.store.mark_profile_dirty();
        self.store.mark_leaderboard_dirty();
        self.store.flush(&self.profile, &self.leaderboard);

        let summary = SessionSummary {
            kills,
            gold_earned,
            level: self.profile.level,
            elapsed_ms,
            new_high_score,
            rank,
            continue_offered: kills >= self.tuning.continue_min_kills,
        };
        match summary.rank {
            Some(rank) => log::info!("Session summary: {} kills, rank #{}", kills, rank),
            None => log::info!("Session summary: {} kills, unranked", kills),
        }
        self.last_summary = Some(summary);
    }

    /// Ask for a rewarded ad to continue after a game over
    pub fn request_continue(&mut self) -> GameResult<()> {
        let summary = self.last_summary.as_ref().ok_or(GameError::NoSession)?;
        if !summary.continue_offered {
            return Err(GameError::ContinueNotOffered);
        }
        if self.pending_continue.is_some() {
            return Ok(());
        }

        let request = RewardRequest::start(
            self.ads.as_mut(),
            self.confirm.as_deref_mut(),
            self.clock_ms,
            Some(REWARDED_AD_TIMEOUT_MS),
        );
        self.pending_continue = Some(request);
        Ok(())
    }

    /// Drive a pending continue request. `Rewarded` starts a new session;
    /// `Declined` and `Unavailable` leave the player on the game over screen.
    pub fn poll_continue(&mut self) -> Option<AdOutcome> {
        let request = self.pending_continue.as_mut()?;
        let outcome = request.poll(self.ads.as_mut(), self.clock_ms)?;
        self.pending_continue = None;

        match outcome {
            AdOutcome::Rewarded => {
                if let Err(e) = self.start_session() {
                    log::warn!("Continue granted but session could not start: {}", e);
                }
            }
            AdOutcome::Declined | AdOutcome::Unavailable => {
                log::info!("Continue not granted ({:?})", outcome);
            }
        }
        Some(outcome)
    }

    fn save_profile(&mut self) {
        self.store.mark_profile_dirty();
        self.store.flush(&self.profile, &self.leaderboard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{LEADERBOARD_KEY, PROFILE_KEY};
    use crate::platform::ads::tests::ScriptedAds;
    use crate::platform::{MemoryStore, NoAds};
    use crate::sim::EnemyKind;
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &'static str) -> GameResult<Option<String>> {
            self.0.borrow().get(key)
        }

        fn set(&mut self, key: &'static str, value: &str) -> GameResult<()> {
            self.0.borrow_mut().set(key, value)
        }
    }

    fn context(store: &SharedStore) -> GameContext {
        GameContext::load(
            Box::new(store.clone()),
            Box::new(NoAds),
            Tuning::default(),
            42,
        )
    }

    /// Kill `kills` enemies, then let one touch the player until lives run out
    fn play_to_game_over(ctx: &mut GameContext, kills: usize) {
        let tuning = ctx.tuning.clone();
        for i in 0..kills {
            let session = ctx.session.as_mut().unwrap();
            let pos = Vec2::new(650.0, 50.0 + (i % 10) as f32 * 50.0);
            session.entities.spawn_enemy(EnemyKind::Normal, pos, &tuning);
            session
                .entities
                .spawn_projectile(pos, Vec2::ZERO, crate::sim::ShotTarget::Enemy, &tuning);
            ctx.tick(&TickInput::default(), 1.0);
        }
        let session = ctx.session.as_mut().unwrap();
        session.lives = 1;
        let pos = session.player.pos;
        session.entities.spawn_enemy(EnemyKind::Normal, pos, &tuning);
        ctx.tick(&TickInput::default(), 1.0);
    }

    #[test]
    fn test_first_run_saves_profile() {
        let store = SharedStore::default();
        let ctx = context(&store);
        assert_eq!(ctx.profile().gold, 1000);
        assert!(store.0.borrow().raw(PROFILE_KEY).is_some());
        assert!(!ctx.has_unsaved_changes());
    }

    #[test]
    fn test_unreadable_storage_does_not_overwrite_profile() {
        let store = SharedStore::default();
        store
            .0
            .borrow_mut()
            .insert(PROFILE_KEY, r#"{"name":"Veteran","gold":98765,"level":9}"#);
        store.0.borrow_mut().fail_reads = true;

        let ctx = context(&store);
        assert_eq!(ctx.profile().gold, 1000);
        assert!(!ctx.has_unsaved_changes());
        let raw = store.0.borrow().raw(PROFILE_KEY).map(str::to_string);
        assert!(raw.is_some_and(|json| json.contains("Veteran")));
    }

    #[test]
    fn test_session_requires_unlock() {
        let store = SharedStore::default();
        let mut ctx = context(&store);
        assert_eq!(ctx.start_session().err(), Some(GameError::CardLocked));

        ctx.unlock_card().unwrap();
        assert_eq!(ctx.profile().gold, 500);
        assert!(ctx.start_session().is_ok());

        // Second unlock is free
        ctx.unlock_card().unwrap();
        assert_eq!(ctx.profile().gold, 500);
    }

    #[test]
    fn test_unlock_with_too_little_gold() {
        let store = SharedStore::default();
        let mut ctx = context(&store);
        ctx.profile.gold = 499;
        assert_eq!(
            ctx.unlock_card(),
            Err(GameError::InsufficientFunds {
                needed: 500,
                available: 499
            })
        );
        assert!(!ctx.profile().unlocked);
    }

    #[test]
    fn test_kills_are_saved_as_they_happen() {
        let store = SharedStore::default();
        let mut ctx = context(&store);
        ctx.unlock_card().unwrap();
        ctx.start_session().unwrap();

        let tuning = ctx.tuning.clone();
        let session = ctx.session.as_mut().unwrap();
        let pos = Vec2::new(650.0, 300.0);
        session.entities.spawn_enemy(EnemyKind::Normal, pos, &tuning);
        session
            .entities
            .spawn_projectile(pos, Vec2::ZERO, crate::sim::ShotTarget::Enemy, &tuning);
        ctx.tick(&TickInput::default(), 1.0);

        let saved: PlayerProfile =
            serde_json::from_str(store.0.borrow().raw(PROFILE_KEY).unwrap()).unwrap();
        assert_eq!(saved.gold, 505);
        assert_eq!(saved.kill_count, 1);
    }

    #[test]
    fn test_game_over_summary() {
        let store = SharedStore::default();
        let mut ctx = context(&store);
        ctx.unlock_card().unwrap();
        ctx.start_session().unwrap();
        play_to_game_over(&mut ctx, 3);

        let summary = ctx.last_summary().unwrap().clone();
        assert_eq!(summary.kills, 3);
        assert_eq!(summary.gold_earned, 15);
        assert_eq!(summary.rank, Some(1));
        assert!(summary.new_high_score);
        assert!(!summary.continue_offered);

        let profile = ctx.profile();
        assert_eq!(profile.games_played, 1);
        assert_eq!(profile.high_score, 3);
        assert_eq!(profile.monthly_score, 3);
        assert_eq!(profile.total_gold_earned, 15);

        let entry = ctx.leaderboard().entry(&profile.name).unwrap();
        assert_eq!(entry.monthly_score, 3);
        assert_eq!(entry.games_played, 1);
        assert!(store.0.borrow().raw(LEADERBOARD_KEY).is_some());

        // Reloading sees the same state
        let reloaded = context(&store);
        assert_eq!(reloaded.profile(), ctx.profile());
        assert_eq!(reloaded.leaderboard(), ctx.leaderboard());
    }

    #[test]
    fn test_restart_cancels_old_session() {
        let store = SharedStore::default();
        let mut ctx = context(&store);
        ctx.unlock_card().unwrap();
        let first = ctx.start_session().unwrap().seed;
        ctx.tick(&TickInput::default(), 500.0);
        let second = ctx.start_session().unwrap();
        assert_ne!(second.seed, first);
        assert_eq!(second.elapsed_ms, 0.0);

        ctx.end_session();
        assert!(ctx.session().is_none());
        assert!(ctx.tick(&TickInput::default(), 16.0).is_empty());
    }

    #[test]
    fn test_continue_needs_enough_kills() {
        let store = SharedStore::default();
        let mut ctx = context(&store);
        assert_eq!(ctx.request_continue(), Err(GameError::NoSession));

        ctx.unlock_card().unwrap();
        ctx.start_session().unwrap();
        play_to_game_over(&mut ctx, 2);
        assert_eq!(ctx.request_continue(), Err(GameError::ContinueNotOffered));
    }

    #[test]
    fn test_rewarded_continue_starts_new_session() {
        let store = SharedStore::default();
        let mut ctx = GameContext::load(
            Box::new(store.clone()),
            Box::new(ScriptedAds {
                polls: vec![None, Some(true)],
                ..Default::default()
            }),
            Tuning::default(),
            42,
        );
        ctx.unlock_card().unwrap();
        ctx.start_session().unwrap();
        play_to_game_over(&mut ctx, 10);
        assert!(ctx.last_summary().unwrap().continue_offered);

        ctx.request_continue().unwrap();
        assert_eq!(ctx.poll_continue(), None);
        assert_eq!(ctx.poll_continue(), Some(AdOutcome::Rewarded));
        let session = ctx.session().unwrap();
        assert!(session.is_running());
        assert_eq!(session.current_kills, 0);
    }

    #[test]
    fn test_declined_prompt_keeps_game_over() {
        let store = SharedStore::default();
        let mut ctx = context(&store).with_confirm_prompt(Box::new(|_: &str| false));
        ctx.unlock_card().unwrap();
        ctx.start_session().unwrap();
        play_to_game_over(&mut ctx, 10);

        ctx.request_continue().unwrap();
        assert_eq!(ctx.poll_continue(), Some(AdOutcome::Declined));
        assert_eq!(ctx.session().unwrap().phase, GamePhase::GameOver);
    }

    #[test]
    fn test_interstitial_failures_do_not_stop_play() {
        let store = SharedStore::default();
        let tuning = Tuning {
            interstitial_interval_ms: 100.0,
            ..Tuning::default()
        };
        let mut ctx = GameContext::load(
            Box::new(store.clone()),
            Box::new(ScriptedAds {
                fail: true,
                ..Default::default()
            }),
            tuning,
            7,
        );
        ctx.unlock_card().unwrap();
        ctx.start_session().unwrap();
        let events = ctx.tick(&TickInput::default(), 150.0);
        assert!(events.contains(&GameEvent::InterstitialDue));
        assert!(ctx.session().unwrap().is_running());
    }
}
