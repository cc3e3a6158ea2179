//! Ad collaborator interface
//!
//! The core never blocks on ads. Interstitials are fire-and-forget; a
//! rewarded ad is a request that resolves to exactly one [`AdOutcome`].

use crate::error::{GameError, GameResult};

/// Terminal result of a rewarded ad request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdOutcome {
    /// The player watched the ad (or confirmed the fallback prompt)
    Rewarded,
    /// The ad was closed early or the prompt was refused
    Declined,
    /// No ad could be shown and there was no fallback
    Unavailable,
}

/// External ad network
pub trait AdProvider {
    fn is_available(&self) -> bool {
        true
    }

    /// Show an interstitial, no completion is reported
    fn show_interstitial(&mut self) -> GameResult<()>;

    /// Begin showing a rewarded ad
    fn request_rewarded(&mut self) -> GameResult<()>;

    /// `Some(true)` once the reward was granted, `Some(false)` if the ad
    /// closed without reward, `None` while it is still showing
    fn poll_rewarded(&mut self) -> Option<bool>;
}

/// Provider used when no ad network is wired in (plain browser, native)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAds;

impl AdProvider for NoAds {
    fn is_available(&self) -> bool {
        false
    }

    fn show_interstitial(&mut self) -> GameResult<()> {
        Err(GameError::AdUnavailable {
            reason: "ads disabled".to_string(),
        })
    }

    fn request_rewarded(&mut self) -> GameResult<()> {
        Err(GameError::AdUnavailable {
            reason: "ads disabled".to_string(),
        })
    }

    fn poll_rewarded(&mut self) -> Option<bool> {
        None
    }
}

/// Local yes/no prompt used when the ad network cannot serve a rewarded ad
pub type ConfirmPrompt<'a> = dyn FnMut(&str) -> bool + 'a;

/// Text of the fallback prompt
pub const CONTINUE_PROMPT: &str = "Watch ad to continue?";

#[derive(Debug, Clone, Copy, PartialEq)]
enum RequestState {
    Pending,
    Done(AdOutcome),
}

/// An in-flight rewarded ad request
#[derive(Debug, Clone)]
pub struct RewardRequest {
    started_ms: f64,
    timeout_ms: Option<f64>,
    state: RequestState,
}

impl RewardRequest {
    /// Ask the provider for a rewarded ad. If it cannot serve one, the
    /// request resolves immediately through `confirm` (or as
    /// [`AdOutcome::Unavailable`] without a prompt).
    pub fn start(
        provider: &mut dyn AdProvider,
        confirm: Option<&mut ConfirmPrompt<'_>>,
        now_ms: f64,
        timeout_ms: Option<f64>,
    ) -> Self {
        let attempt = if provider.is_available() {
            provider.request_rewarded()
        } else {
            Err(GameError::AdUnavailable {
                reason: "provider not available".to_string(),
            })
        };

        let state = match attempt {
            Ok(()) => RequestState::Pending,
            Err(e) => {
                log::warn!("Rewarded ad failed ({}), falling back to prompt", e);
                RequestState::Done(Self::fallback(confirm))
            }
        };

        Self {
            started_ms: now_ms,
            timeout_ms,
            state,
        }
    }

    fn fallback(confirm: Option<&mut ConfirmPrompt<'_>>) -> AdOutcome {
        match confirm {
            Some(prompt) => {
                if prompt(CONTINUE_PROMPT) {
                    AdOutcome::Rewarded
                } else {
                    AdOutcome::Declined
                }
            }
            None => AdOutcome::Unavailable,
        }
    }

    /// Advance the request. Once resolved it keeps returning the same outcome.
    pub fn poll(&mut self, provider: &mut dyn AdProvider, now_ms: f64) -> Option<AdOutcome> {
        if let RequestState::Done(outcome) = self.state {
            return Some(outcome);
        }

        let outcome = match provider.poll_rewarded() {
            Some(true) => Some(AdOutcome::Rewarded),
            Some(false) => Some(AdOutcome::Declined),
            None => match self.timeout_ms {
                Some(timeout) if now_ms - self.started_ms >= timeout => {
                    log::warn!("Rewarded ad timed out after {}ms", timeout);
                    Some(AdOutcome::Unavailable)
                }
                _ => None,
            },
        };

        if let Some(outcome) = outcome {
            log::info!("Rewarded ad resolved: {:?}", outcome);
            self.state = RequestState::Done(outcome);
        }
        outcome
    }

    pub fn outcome(&self) -> Option<AdOutcome> {
        match self.state {
            RequestState::Done(outcome) => Some(outcome),
            RequestState::Pending => None,
        }
    }
}
