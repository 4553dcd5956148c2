//! Bounded chat memory and history summarization.
//!
//! Every stored turn is checked against the chat's history limit; past the
//! limit the raw history is folded into a running summary and cleared, and the
//! participants' attitudes are reassessed. The summary is the compacted memory
//! of everything already evicted from raw history.

use crate::interest::InterestBuffer;
use crate::message::{ChatId, ChatMessage, ChatRole, UserId};
use crate::ports::{
    AttitudePrior, ChatConfigSource, CompletionService, MessageStore, SummaryStore, UserStore,
};
use anyhow::Result;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Per-chat serialization point for the append-then-check sequence.
///
/// Messages from one chat are expected to arrive in order, but nothing
/// upstream enforces one-at-a-time processing; without this lock two in-flight
/// appends could race the history-length check and double-summarize.
#[derive(Debug, Default)]
pub struct ChatLocks {
    chats: Mutex<HashMap<ChatId, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock handle for one chat, created on first use.
    pub async fn handle(&self, chat_id: ChatId) -> Arc<Mutex<()>> {
        let mut chats = self.chats.lock().await;
        Arc::clone(chats.entry(chat_id).or_default())
    }
}

/// Folds raw history into the running summary and reassesses participant
/// attitudes after each compaction.
pub struct HistorySummarizer {
    completion: Arc<dyn CompletionService>,
    messages: Arc<dyn MessageStore>,
    summaries: Arc<dyn SummaryStore>,
    users: Arc<dyn UserStore>,
}

impl HistorySummarizer {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        messages: Arc<dyn MessageStore>,
        summaries: Arc<dyn SummaryStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            completion,
            messages,
            summaries,
            users,
        }
    }

    /// Compact `history` into the stored summary if it exceeds `limit`.
    ///
    /// Returns whether compaction happened. The raw history is cleared only
    /// after the replacement summary is durably stored — a failure anywhere
    /// propagates and leaves the history intact, never the other way around.
    pub async fn summarize(
        &self,
        chat_id: ChatId,
        history: &[ChatMessage],
        limit: usize,
    ) -> Result<bool> {
        if history.len() <= limit {
            return Ok(false);
        }

        let prev = self.summaries.get_summary(chat_id).await?;
        let prev = (!prev.is_empty()).then_some(prev);
        let summary = self.completion.summarize(history, prev.as_deref()).await?;
        self.summaries.set_summary(chat_id, &summary).await?;
        self.messages.clear_messages(chat_id).await?;

        info!(
            chat_id,
            turns = history.len(),
            summary_len = summary.len(),
            "history compacted into summary"
        );
        Ok(true)
    }

    /// Reassess each participant's attitude from the just-compacted history.
    ///
    /// Best-effort end to end: blank attitudes and usernames that resolve to
    /// no known sender are skipped, and individual store failures are logged
    /// and swallowed.
    pub async fn assess_users(&self, chat_id: ChatId, history: &[ChatMessage]) -> Result<()> {
        // De-duplicated participants in first-seen order.
        let mut participants: IndexMap<UserId, String> = IndexMap::new();
        for msg in history {
            if msg.role != ChatRole::User {
                continue;
            }
            if let (Some(user_id), Some(username)) = (msg.user_id, &msg.username) {
                participants.entry(user_id).or_insert_with(|| username.clone());
            }
        }
        if participants.is_empty() {
            debug!(chat_id, "no identifiable participants, skipping attitude assessment");
            return Ok(());
        }

        let mut priors = Vec::with_capacity(participants.len());
        for (user_id, username) in &participants {
            let attitude = self
                .users
                .find_by_id(*user_id)
                .await?
                .and_then(|user| user.attitude);
            priors.push(AttitudePrior {
                username: username.clone(),
                attitude,
            });
        }

        let assessments = self.completion.assess_users(history, &priors).await?;

        // Resolve usernames back to sender ids, first occurrence winning when
        // two senders share a username.
        let mut by_username: HashMap<&str, UserId> = HashMap::new();
        for msg in history {
            if let (Some(user_id), Some(username)) = (msg.user_id, msg.username.as_deref()) {
                by_username.entry(username).or_insert(user_id);
            }
        }

        for assessment in assessments {
            let attitude = assessment.attitude.trim();
            if attitude.is_empty() {
                debug!(chat_id, username = %assessment.username, "blank attitude, skipping");
                continue;
            }
            let Some(&user_id) = by_username.get(assessment.username.as_str()) else {
                debug!(
                    chat_id,
                    username = %assessment.username,
                    "assessed username not found in history, skipping"
                );
                continue;
            };
            if let Err(err) = self.users.set_attitude(user_id, attitude).await {
                warn!(chat_id, user_id, error = %err, "failed to store attitude");
            }
        }

        Ok(())
    }
}

/// Bounded view over one chat's durable history.
///
/// A per-chat handle over shared services; the whole append-then-check
/// sequence runs under the chat's lock from [`ChatLocks`].
pub struct ChatMemory {
    chat_id: ChatId,
    messages: Arc<dyn MessageStore>,
    interest: Arc<InterestBuffer>,
    summarizer: Arc<HistorySummarizer>,
    config: Arc<dyn ChatConfigSource>,
    lock: Arc<Mutex<()>>,
}

impl ChatMemory {
    pub async fn open(
        chat_id: ChatId,
        messages: Arc<dyn MessageStore>,
        interest: Arc<InterestBuffer>,
        summarizer: Arc<HistorySummarizer>,
        config: Arc<dyn ChatConfigSource>,
        locks: &ChatLocks,
    ) -> Self {
        let lock = locks.handle(chat_id).await;
        Self {
            chat_id,
            messages,
            interest,
            summarizer,
            config,
            lock,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Store one turn and run the compaction check.
    ///
    /// The message lands in both the durable store and the interest buffer.
    /// Summarization is evaluated strictly after insertion, so the history may
    /// transiently exceed the limit by one message (soft bound). A failed
    /// attitude reassessment never rolls back a completed compaction.
    pub async fn add_message(&self, msg: ChatMessage) -> Result<()> {
        let _guard = self.lock.lock().await;

        self.messages.add_message(&msg).await?;
        self.interest.add_message(msg).await;

        let history = self.messages.get_messages(self.chat_id).await?;
        let limit = self.config.get_config(self.chat_id).await?.history_limit;
        debug!(
            chat_id = self.chat_id,
            turns = history.len(),
            limit,
            "stored message, checking history limit"
        );

        let compacted = self
            .summarizer
            .summarize(self.chat_id, &history, limit)
            .await?;
        if compacted
            && let Err(err) = self.summarizer.assess_users(self.chat_id, &history).await
        {
            warn!(
                chat_id = self.chat_id,
                error = %err,
                "attitude reassessment failed, summary kept"
            );
        }
        Ok(())
    }

    /// Full raw history for this chat, oldest first.
    pub async fn get_history(&self) -> Result<Vec<ChatMessage>> {
        self.messages.get_messages(self.chat_id).await
    }
}
