//! Save/load of the player profile and the leaderboard
//!
//! Two named JSON blobs in a [`KeyValueStore`]:
//! - `survivorState`: the [`PlayerProfile`] object
//! - `globalLeaderboard`: the [`Leaderboard`] array
//!
//! Corrupt blobs are replaced by defaults on load. A failed save leaves the
//! blob dirty so the next save attempt writes it again.

use rand::Rng;
use serde::Serialize;

use crate::error::{GameError, GameResult};
use crate::leaderboard::Leaderboard;
use crate::platform::KeyValueStore;
use crate::progression::PlayerProfile;
use crate::tuning::Tuning;

/// Storage key of the profile blob
pub const PROFILE_KEY: &str = "survivorState";
/// Storage key of the leaderboard blob
pub const LEADERBOARD_KEY: &str = "globalLeaderboard";

/// Profile + leaderboard persistence over a storage backend
pub struct ProfileStore {
    backend: Box<dyn KeyValueStore>,
    profile_dirty: bool,
    leaderboard_dirty: bool,
}

impl ProfileStore {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            profile_dirty: false,
            leaderboard_dirty: false,
        }
    }

    /// Load the profile, creating a fresh one on first run or corruption.
    /// A failed read also yields a fresh profile, but it is not written back
    /// until something changes it, so the stored blob survives.
    pub fn load_profile<R: Rng>(&mut self, rng: &mut R, tuning: &Tuning) -> PlayerProfile {
        match self.read::<PlayerProfile>(PROFILE_KEY) {
            Ok(Some(mut profile)) => {
                profile.sanitize();
                log::info!(
                    "Loaded profile {} (level {}, {} gold)",
                    profile.name,
                    profile.level,
                    profile.gold
                );
                profile
            }
            Ok(None) => {
                let profile = PlayerProfile::with_random_name(rng, tuning);
                log::info!("No profile found, created {}", profile.name);
                self.profile_dirty = true;
                profile
            }
            Err(e @ GameError::PersistenceCorrupt { .. }) => {
                log::warn!("{}; starting with a fresh profile", e);
                self.profile_dirty = true;
                PlayerProfile::with_random_name(rng, tuning)
            }
            Err(e) => {
                log::warn!("{}; playing with an unsaved profile", e);
                PlayerProfile::with_random_name(rng, tuning)
            }
        }
    }

    /// Load the leaderboard, empty on first run or corruption
    pub fn load_leaderboard(&mut self) -> Leaderboard {
        match self.read::<Leaderboard>(LEADERBOARD_KEY) {
            Ok(Some(mut board)) => {
                board.normalize();
                log::info!("Loaded leaderboard ({} entries)", board.len());
                board
            }
            Ok(None) => {
                log::info!("No leaderboard found, starting fresh");
                Leaderboard::new()
            }
            Err(e) => {
                log::warn!("{}; starting with an empty leaderboard", e);
                Leaderboard::new()
            }
        }
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &'static str) -> GameResult<Option<T>> {
        let Some(json) = self.backend.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| GameError::PersistenceCorrupt {
                key,
                reason: e.to_string(),
            })
    }

    fn write<T: Serialize>(&mut self, key: &'static str, value: &T) -> GameResult<()> {
        let json = serde_json::to_string(value).map_err(|e| GameError::Storage {
            key,
            reason: e.to_string(),
        })?;
        self.backend.set(key, &json)
    }

    pub fn mark_profile_dirty(&mut self) {
        self.profile_dirty = true;
    }

    pub fn mark_leaderboard_dirty(&mut self) {
        self.leaderboard_dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.profile_dirty || self.leaderboard_dirty
    }

    /// Write every dirty blob. Failures are logged and the blob stays dirty.
    pub fn flush(&mut self, profile: &PlayerProfile, leaderboard: &Leaderboard) {
        if self.profile_dirty {
            match self.write(PROFILE_KEY, profile) {
                Ok(()) => self.profile_dirty = false,
                Err(e) => log::warn!("Profile save failed, will retry: {}", e),
            }
        }
        if self.leaderboard_dirty {
            match self.write(LEADERBOARD_KEY, leaderboard) {
                Ok(()) => {
                    self.leaderboard_dirty = false;
                    log::info!("Leaderboard saved ({} entries)", leaderboard.len());
                }
                Err(e) => log::warn!("Leaderboard save failed, will retry: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// Store whose blobs outlive the `ProfileStore` that wrote them
    #[derive(Clone, Default)]
    struct SharedStore(std::rc::Rc<std::cell::RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &'static str) -> GameResult<Option<String>> {
            self.0.borrow().get(key)
        }

        fn set(&mut self, key: &'static str, value: &str) -> GameResult<()> {
            self.0.borrow_mut().set(key, value)
        }
    }

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(1)
    }

    #[test]
    fn test_first_run_defaults() {
        let tuning = Tuning::default();
        let mut store = ProfileStore::new(Box::new(MemoryStore::new()));
        let profile = store.load_profile(&mut rng(), &tuning);
        assert_eq!(profile.gold, 1000);
        assert_eq!(profile.level, 1);
        assert!(!profile.unlocked);
        assert!(store.is_dirty());
        assert!(store.load_leaderboard().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let tuning = Tuning::default();
        let shared = SharedStore::default();

        let mut profile = PlayerProfile::new("Nova", &tuning);
        profile.gold = 77;
        profile.level = 4;
        profile.unlocked = true;
        profile.kill_count = 120;
        profile.high_score = 35;
        profile.total_gold_earned = 640;
        profile.games_played = 9;
        profile.monthly_score = 88;
        let mut board = Leaderboard::new();
        board.submit("Nova", 35, 175, 4);

        let mut store = ProfileStore::new(Box::new(shared.clone()));
        store.mark_profile_dirty();
        store.mark_leaderboard_dirty();
        store.flush(&profile, &board);
        assert!(!store.is_dirty());

        let mut reopened = ProfileStore::new(Box::new(shared));
        assert_eq!(reopened.load_profile(&mut rng(), &tuning), profile);
        assert_eq!(reopened.load_leaderboard(), board);
    }

    #[test]
    fn test_corrupt_blobs_fall_back() {
        let tuning = Tuning::default();
        let mut backend = MemoryStore::new();
        backend.insert(PROFILE_KEY, "{ gold: lots");
        backend.insert(LEADERBOARD_KEY, "{\"not\":\"an array\"}");
        let mut store = ProfileStore::new(Box::new(backend));

        let profile = store.load_profile(&mut rng(), &tuning);
        assert_eq!(profile.gold, tuning.starting_gold);
        assert!(store.load_leaderboard().is_empty());
    }

    #[test]
    fn test_failed_read_keeps_stored_blobs() {
        let tuning = Tuning::default();
        let shared = SharedStore::default();
        shared.0.borrow_mut().insert(
            PROFILE_KEY,
            r#"{"name":"Veteran","gold":98765,"level":9,"unlocked":true}"#,
        );
        shared.0.borrow_mut().insert(LEADERBOARD_KEY, "[]");
        shared.0.borrow_mut().fail_reads = true;

        let mut store = ProfileStore::new(Box::new(shared.clone()));
        let profile = store.load_profile(&mut rng(), &tuning);
        let board = store.load_leaderboard();
        assert_eq!(profile.gold, tuning.starting_gold);
        assert!(board.is_empty());
        assert!(!store.is_dirty());

        store.flush(&profile, &board);
        let raw = shared.0.borrow().raw(PROFILE_KEY).map(str::to_string);
        assert!(raw.is_some_and(|json| json.contains("Veteran")));
    }

    #[test]
    fn test_failed_save_stays_dirty() {
        let tuning = Tuning::default();
        let shared = SharedStore::default();
        shared.0.borrow_mut().fail_writes = true;

        let profile = PlayerProfile::new("Nova", &tuning);
        let board = Leaderboard::new();
        let mut store = ProfileStore::new(Box::new(shared.clone()));
        store.mark_profile_dirty();
        store.flush(&profile, &board);
        assert!(store.is_dirty());

        shared.0.borrow_mut().fail_writes = false;
        store.flush(&profile, &board);
        assert!(!store.is_dirty());
        assert!(shared.0.borrow().raw(PROFILE_KEY).is_some());
    }
}
