//! Game error types
//!
//! Nothing in here is fatal. Callers either recover locally (corrupt saves
//! fall back to defaults, failed ads degrade) or surface a transient message
//! to the player (insufficient gold).

use std::fmt;

/// Top-level error enum for the game core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Unlock attempted without enough gold in the wallet.
    InsufficientFunds {
        /// Price of the unlock.
        needed: u64,
        /// Gold the player actually has.
        available: u64,
    },

    /// A session was requested before the card was unlocked.
    CardLocked,

    /// A stored blob exists but could not be parsed.
    PersistenceCorrupt {
        /// Storage key of the blob.
        key: &'static str,
        reason: String,
    },

    /// The storage backend refused a read or write.
    Storage { key: &'static str, reason: String },

    /// The ad collaborator is missing or failed to show an ad.
    AdUnavailable { reason: String },

    /// Tuning overrides could not be parsed.
    InvalidTuning { reason: String },

    /// An operation needed a live session and there is none.
    NoSession,

    /// A rewarded continue was requested but the last run does not qualify.
    ContinueNotOffered,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::InsufficientFunds { needed, available } => write!(
                f,
                "not enough gold: need {}, have {}",
                needed, available
            ),
            GameError::CardLocked => write!(f, "card is locked, unlock it first"),
            GameError::PersistenceCorrupt { key, reason } => {
                write!(f, "stored '{}' is corrupt: {}", key, reason)
            }
            GameError::Storage { key, reason } => {
                write!(f, "storage error for '{}': {}", key, reason)
            }
            GameError::AdUnavailable { reason } => write!(f, "ad unavailable: {}", reason),
            GameError::InvalidTuning { reason } => write!(f, "invalid tuning: {}", reason),
            GameError::NoSession => write!(f, "no active session"),
            GameError::ContinueNotOffered => {
                write!(f, "continue is not offered for the last run")
            }
        }
    }
}

impl std::error::Error for GameError {}

/// Convenience alias: a `Result` using `GameError` as the error type.
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_message() {
        let err = GameError::InsufficientFunds {
            needed: 500,
            available: 499,
        };
        assert_eq!(err.to_string(), "not enough gold: need 500, have 499");
    }

    #[test]
    fn test_errors_are_std_errors() {
        let err: Box<dyn std::error::Error> = Box::new(GameError::NoSession);
        assert_eq!(err.to_string(), "no active session");
    }
}
