//! Domain message types shared across the engagement core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ChatId = i64;
pub type UserId = i64;
pub type MessageId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One stored conversation turn. Immutable after creation — history is only
/// ever deleted in bulk during summarization, never edited per message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    pub chat_id: ChatId,
    /// Relationship label attached to the *sender*, looked up at read time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attitude: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(chat_id: ChatId, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            username: None,
            full_name: None,
            first_name: None,
            last_name: None,
            reply_text: None,
            reply_username: None,
            quote_text: None,
            user_id: None,
            message_id: None,
            chat_id,
            attitude: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(chat_id: ChatId, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            ..Self::user(chat_id, content)
        }
    }
}

/// The message being replied to, as reported by the platform adapter.
#[derive(Debug, Clone, Default)]
pub struct ReplyInfo {
    /// True when the replied-to message was sent by the bot itself.
    pub from_bot: bool,
    pub username: Option<String>,
    pub text: String,
}

/// Raw platform view of one inbound message, consumed by triggers.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub text: String,
    pub reply: Option<ReplyInfo>,
    pub quote_text: Option<String>,
}

impl InboundEvent {
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }

    /// Normalize into the mutable view triggers operate on.
    pub fn to_context(&self) -> MessageContext {
        let reply_text = self.reply.as_ref().map(|r| match &r.username {
            Some(username) => format!("{} (from {})", r.text, username),
            None => r.text.clone(),
        });
        MessageContext {
            text: self.text.clone(),
            reply_text,
            chat_id: self.chat_id,
        }
    }

    /// Build the durable history entry for this event.
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            username: self.username.clone(),
            full_name: self.full_name(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            reply_text: self.reply.as_ref().map(|r| r.text.clone()),
            reply_username: self.reply.as_ref().and_then(|r| r.username.clone()),
            quote_text: self.quote_text.clone(),
            user_id: self.user_id,
            message_id: Some(self.message_id),
            ..ChatMessage::user(self.chat_id, self.text.clone())
        }
    }
}

/// Normalized view of one inbound message. `chat_id` is stable for the
/// lifetime of the context; `text` is rewritten at most once per trigger
/// evaluation pass (evaluation short-circuits on the first match).
#[derive(Debug, Clone)]
pub struct MessageContext {
    pub text: String,
    pub reply_text: Option<String>,
    pub chat_id: ChatId,
}

/// Why a trigger decided the bot should engage, passed to the reply generator
/// as extra context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerReason {
    /// The message content that drew attention.
    pub message: String,
    /// The model's stated rationale.
    pub why: String,
}

/// Outcome of a positive trigger evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerDecision {
    /// Message the answer should anchor to as a platform-level reply, if any.
    pub reply_to: Option<MessageId>,
    pub reason: Option<TriggerReason>,
}
