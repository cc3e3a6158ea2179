//! Platform abstraction layer
//!
//! The collaborators the simulation core talks to:
//! - Input state (keyboard + on-screen buttons)
//! - Storage (LocalStorage on web, files or memory natively)
//! - Ads (rewarded continue, interstitials)

pub mod ads;
pub mod input;
pub mod storage;

pub use ads::{AdOutcome, AdProvider, NoAds, RewardRequest};
pub use input::{Direction, InputState};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStore;
