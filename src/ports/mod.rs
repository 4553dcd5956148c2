//! Ports to the external collaborators this core depends on.
//!
//! Implementations live with the process wiring (platform adapter, durable
//! stores, LLM client); the core only ever sees `Arc<dyn Trait>` handles.

use crate::message::{ChatId, ChatMessage, TriggerReason, UserId};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Durable per-chat message history.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn add_message(&self, msg: &ChatMessage) -> Result<()>;
    /// Full history for a chat, oldest first.
    async fn get_messages(&self, chat_id: ChatId) -> Result<Vec<ChatMessage>>;
    async fn get_count(&self, chat_id: ChatId) -> Result<usize>;
    /// Most recent `limit` messages, oldest first.
    async fn get_last_messages(&self, chat_id: ChatId, limit: usize) -> Result<Vec<ChatMessage>>;
    async fn clear_messages(&self, chat_id: ChatId) -> Result<()>;
}

/// Running per-chat summary, monotonically replaced.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Returns the stored summary, or `""` when none exists yet.
    async fn get_summary(&self, chat_id: ChatId) -> Result<String>;
    async fn set_summary(&self, chat_id: ChatId, summary: &str) -> Result<()>;
}

/// User-store view of a known chat participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    pub user_id: UserId,
    pub attitude: Option<String>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<StoredUser>>;
    async fn set_attitude(&self, user_id: UserId, attitude: &str) -> Result<()>;
}

/// Per-chat tuning values, owned by the admin/config surface.
#[async_trait]
pub trait ChatConfigSource: Send + Sync {
    async fn get_config(&self, chat_id: ChatId) -> Result<crate::config::ChatConfig>;
}

/// A positive interest sample as the model reports it. The `message_id` is a
/// free-text echo of an id from the window and is not trusted until resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestSample {
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub why: String,
}

/// A participant's previously recorded attitude, seeding reassessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttitudePrior {
    pub username: String,
    pub attitude: Option<String>,
}

/// One reassessed participant attitude as the model reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttitudeAssessment {
    pub username: String,
    pub attitude: String,
}

/// LLM completion surface used by the engagement core.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate the bot's answer from history, summary, and the trigger's
    /// stated reason (when engagement was proactive).
    async fn ask(
        &self,
        history: &[ChatMessage],
        summary: Option<&str>,
        reason: Option<&TriggerReason>,
    ) -> Result<String>;

    /// Fold `history` into `prev_summary`, returning the replacement summary.
    async fn summarize(
        &self,
        history: &[ChatMessage],
        prev_summary: Option<&str>,
    ) -> Result<String>;

    /// Decide whether anything in `window` is worth proactively addressing.
    async fn check_interest(
        &self,
        window: &[ChatMessage],
        summary: &str,
    ) -> Result<Option<InterestSample>>;

    /// Reassess each participant's attitude after a summarization event.
    async fn assess_users(
        &self,
        history: &[ChatMessage],
        priors: &[AttitudePrior],
    ) -> Result<Vec<AttitudeAssessment>>;
}
