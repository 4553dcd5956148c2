//! Engagement configuration.
//!
//! Per-chat limits are validated here, at the config-write boundary.
//! [`crate::memory::ChatMemory`] and [`crate::interest::InterestSampler`] trust
//! whatever values they are handed.

use crate::errors::BarnacleError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on `history_limit` — beyond this the summarization prompt
/// stops fitting comfortably in one completion request.
pub const MAX_HISTORY_LIMIT: usize = 500;

/// Upper bound on `interest_interval`.
pub const MAX_INTEREST_INTERVAL: usize = 500;

/// How the bot recognizes itself in message text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotIdentity {
    /// Display name matched as a message prefix ("Карл, ..." / "carl: ...").
    pub name: String,
    /// Platform handle matched anywhere in the text ("@carlbot").
    pub handle: String,
}

/// Per-chat tuning for the memory and sampling thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Max stored turns before the history is compacted into the summary.
    #[serde(default = "default_history_limit", rename = "historyLimit")]
    pub history_limit: usize,
    /// Message count between proactive interest samples.
    #[serde(default = "default_interest_interval", rename = "interestInterval")]
    pub interest_interval: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            interest_interval: default_interest_interval(),
        }
    }
}

fn default_history_limit() -> usize {
    50
}

fn default_interest_interval() -> usize {
    20
}

impl ChatConfig {
    pub fn validate(&self) -> Result<(), BarnacleError> {
        if self.history_limit == 0 {
            return Err(BarnacleError::Config("historyLimit must be > 0".into()));
        }
        if self.history_limit > MAX_HISTORY_LIMIT {
            return Err(BarnacleError::Config(format!(
                "historyLimit is unreasonably large (> {})",
                MAX_HISTORY_LIMIT
            )));
        }
        if self.interest_interval == 0 {
            return Err(BarnacleError::Config("interestInterval must be > 0".into()));
        }
        if self.interest_interval > MAX_INTEREST_INTERVAL {
            return Err(BarnacleError::Config(format!(
                "interestInterval is unreasonably large (> {})",
                MAX_INTEREST_INTERVAL
            )));
        }
        Ok(())
    }
}

/// Process-wide engagement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementConfig {
    pub identity: BotIdentity,
    /// How long an active dialogue window stays open without a new match.
    #[serde(default = "default_dialogue_timeout_s", rename = "dialogueTimeoutSeconds")]
    pub dialogue_timeout_s: u64,
}

impl EngagementConfig {
    pub fn dialogue_timeout(&self) -> Duration {
        Duration::from_secs(self.dialogue_timeout_s)
    }

    pub fn validate(&self) -> Result<(), BarnacleError> {
        if self.identity.name.trim().is_empty() {
            return Err(BarnacleError::Config("identity.name must not be empty".into()));
        }
        if self.identity.handle.trim().is_empty() {
            return Err(BarnacleError::Config(
                "identity.handle must not be empty".into(),
            ));
        }
        if !self.identity.handle.is_ascii() {
            // Mention stripping relies on ASCII-stable byte offsets.
            return Err(BarnacleError::Config(
                "identity.handle must be ASCII (platform handles always are)".into(),
            ));
        }
        if self.dialogue_timeout_s == 0 {
            return Err(BarnacleError::Config(
                "dialogueTimeoutSeconds must be > 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_dialogue_timeout_s() -> u64 {
    120
}
