//! Proactive interest sampling.
//!
//! A per-chat, in-memory sliding window of recent messages, independent of the
//! durable history, is periodically drained and shown to the model to decide
//! whether the bot should engage without being addressed. The buffer is
//! ephemeral by design — losing it on restart just skips one heuristic nudge.

use crate::message::{ChatId, ChatMessage, MessageId};
use crate::ports::{ChatConfigSource, CompletionService, SummaryStore};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Per-chat append-only window of recent messages. Only ever bulk-cleared by
/// [`InterestSampler::check`] once the sampling interval is reached.
#[derive(Debug, Default)]
pub struct InterestBuffer {
    chats: Mutex<HashMap<ChatId, Vec<ChatMessage>>>,
}

impl InterestBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_message(&self, msg: ChatMessage) {
        let mut chats = self.chats.lock().await;
        chats.entry(msg.chat_id).or_default().push(msg);
    }

    pub async fn count(&self, chat_id: ChatId) -> usize {
        let chats = self.chats.lock().await;
        chats.get(&chat_id).map_or(0, Vec::len)
    }

    /// The most recent `limit` messages, oldest first.
    pub async fn last_messages(&self, chat_id: ChatId, limit: usize) -> Vec<ChatMessage> {
        let chats = self.chats.lock().await;
        let Some(messages) = chats.get(&chat_id) else {
            return Vec::new();
        };
        let start = messages.len().saturating_sub(limit);
        messages[start..].to_vec()
    }

    pub async fn clear_messages(&self, chat_id: ChatId) {
        let mut chats = self.chats.lock().await;
        chats.remove(&chat_id);
    }
}

/// A resolved positive sample: which message to anchor the reply to and the
/// model's rationale for engaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestHit {
    pub message_id: MessageId,
    /// Content of the sampled message.
    pub message: String,
    pub why: String,
}

/// Counts buffered messages and, once the configured interval is reached,
/// drains the window and asks the model whether anything in it is worth
/// proactively addressing.
pub struct InterestSampler {
    buffer: Arc<InterestBuffer>,
    completion: Arc<dyn CompletionService>,
    summaries: Arc<dyn SummaryStore>,
    config: Arc<dyn ChatConfigSource>,
}

impl InterestSampler {
    pub fn new(
        buffer: Arc<InterestBuffer>,
        completion: Arc<dyn CompletionService>,
        summaries: Arc<dyn SummaryStore>,
        config: Arc<dyn ChatConfigSource>,
    ) -> Self {
        Self {
            buffer,
            completion,
            summaries,
            config,
        }
    }

    /// Run one sampling decision for `chat_id`.
    ///
    /// Below the interval this is a pure no-op. At or above it the window is
    /// drained unconditionally — the interval resets even on a miss — and the
    /// model's verdict is resolved against the drained window. A sample id
    /// that matches nothing in the window is treated as a miss, not an error.
    pub async fn check(&self, chat_id: ChatId) -> Result<Option<InterestHit>> {
        let interval = self.config.get_config(chat_id).await?.interest_interval;
        let buffered = self.buffer.count(chat_id).await;
        if buffered < interval {
            return Ok(None);
        }

        let window = self.buffer.last_messages(chat_id, interval).await;
        self.buffer.clear_messages(chat_id).await;
        debug!(chat_id, window = window.len(), "interest interval reached, sampling");

        let summary = self.summaries.get_summary(chat_id).await?;
        let Some(sample) = self.completion.check_interest(&window, &summary).await? else {
            debug!(chat_id, "interest sample: miss");
            return Ok(None);
        };

        let matched = window.iter().find(|msg| {
            msg.message_id
                .is_some_and(|id| id.to_string() == sample.message_id)
        });
        let Some(matched) = matched else {
            debug!(
                chat_id,
                message_id = %sample.message_id,
                "interest sample referenced a message outside the window, ignoring"
            );
            return Ok(None);
        };

        debug!(chat_id, message_id = %sample.message_id, "interest sample: hit");
        Ok(Some(InterestHit {
            message_id: matched.message_id.unwrap_or_default(),
            message: matched.content.clone(),
            why: sample.why,
        }))
    }
}
