//! Timed per-chat dialogue windows.
//!
//! A chat is "active" while the bot is in a back-and-forth with it; activity
//! suppresses proactive interest-based engagement. The window is advanced
//! forward on every trigger match and expires on its own — there is no
//! explicit stop operation.

use crate::message::ChatId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct DialogueState {
    expires_at: Instant,
    /// Identifies the sleeper task allowed to remove this entry. A stale
    /// sleeper (cancelled by a later start/extend) sees a newer epoch and
    /// leaves the entry alone, so cancel-and-replace cannot race the fire.
    epoch: u64,
}

#[derive(Debug, Default)]
struct ActivityMap {
    entries: HashMap<ChatId, DialogueState>,
    next_epoch: u64,
}

/// Per-chat timer-backed activity flag with extend/expire semantics.
///
/// Two states per chat: inactive (no entry) and active (entry with a
/// deadline). `start` and `extend` behave identically — the distinction is
/// purely for observability.
#[derive(Debug)]
pub struct DialogueActivity {
    timeout: Duration,
    states: Arc<Mutex<ActivityMap>>,
}

impl DialogueActivity {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            states: Arc::new(Mutex::new(ActivityMap::default())),
        }
    }

    /// Open a dialogue window for `chat_id`, replacing any existing one.
    pub async fn start(&self, chat_id: ChatId) {
        debug!(chat_id, timeout_s = self.timeout.as_secs(), "starting dialogue window");
        self.arm(chat_id).await;
    }

    /// Push an open window's deadline forward. Same transition as [`start`];
    /// callers use it when the chat is already active.
    ///
    /// [`start`]: DialogueActivity::start
    pub async fn extend(&self, chat_id: ChatId) {
        debug!(chat_id, timeout_s = self.timeout.as_secs(), "extending dialogue window");
        self.arm(chat_id).await;
    }

    /// True iff an unexpired window exists. The deadline is checked lazily,
    /// so the answer is correct even before the sleeper task has run.
    pub async fn is_active(&self, chat_id: ChatId) -> bool {
        let map = self.states.lock().await;
        map.entries
            .get(&chat_id)
            .is_some_and(|state| state.expires_at > Instant::now())
    }

    /// Cancel-then-arm inside one critical section: bump the epoch, store the
    /// new deadline, and spawn a sleeper that only removes the entry if its
    /// epoch is still current when it fires.
    async fn arm(&self, chat_id: ChatId) {
        let epoch = {
            let mut map = self.states.lock().await;
            map.next_epoch += 1;
            let epoch = map.next_epoch;
            map.entries.insert(
                chat_id,
                DialogueState {
                    expires_at: Instant::now() + self.timeout,
                    epoch,
                },
            );
            epoch
        };

        let states = Arc::clone(&self.states);
        let timeout = self.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut map = states.lock().await;
            let current = map
                .entries
                .get(&chat_id)
                .is_some_and(|state| state.epoch == epoch);
            if current {
                map.entries.remove(&chat_id);
                debug!(chat_id, "dialogue window expired");
            }
        });
    }
}
