//! TokenHooks – admits or rejects movement events before evaluation.

use crate::config::TripwireConfig;
use crate::types::{ChangeOrigin, Token, TokenChange};
use log::debug;

#[derive(Debug, Clone)]
pub struct TokenHooks {
    config: TripwireConfig,
}

impl TokenHooks {
    pub fn new(config: &TripwireConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Is this committed change of `token` eligible for trigger evaluation?
    pub fn can_run_token_update(&self, change: &TokenChange, token: &Token, paused: bool) -> bool {
        if paused && !self.config.trigger_when_paused {
            debug!("Skipping token update: session paused");
            return false;
        }
        if !change.is_positional() {
            return false;
        }
        if change.origin == ChangeOrigin::TriggerSnap {
            debug!("Skipping token update: trigger snap");
            return false;
        }
        if token.hidden && !self.config.trigger_when_hidden {
            debug!("Skipping token update: token {} is hidden", token.id);
            return false;
        }
        if !self.config.disposition_allowed(token.disposition) {
            debug!(
                "Skipping token update: disposition {:?} not allowed",
                token.disposition
            );
            return false;
        }
        true
    }
}
