//! End-to-end engagement flow for one inbound message.
//!
//! Wires the pipeline, memory, and activity pieces together the way a platform
//! adapter consumes them: store the turn, decide whether to respond, generate
//! the answer, store the answer. Callers treat any error as "the bot did not
//! respond this turn".

use crate::activity::DialogueActivity;
use crate::config::EngagementConfig;
use crate::interest::{InterestBuffer, InterestSampler};
use crate::memory::{ChatLocks, ChatMemory, HistorySummarizer};
use crate::message::{ChatId, ChatMessage, InboundEvent, MessageId};
use crate::ports::{ChatConfigSource, CompletionService, MessageStore, SummaryStore, UserStore};
use crate::triggers::TriggerPipeline;
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// A generated answer and the message it should anchor to, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub reply_to: Option<MessageId>,
}

/// Owns the engagement core's moving parts and drives one message at a time.
pub struct EngagementEngine {
    messages: Arc<dyn MessageStore>,
    summaries: Arc<dyn SummaryStore>,
    chat_config: Arc<dyn ChatConfigSource>,
    completion: Arc<dyn CompletionService>,
    interest: Arc<InterestBuffer>,
    summarizer: Arc<HistorySummarizer>,
    pipeline: TriggerPipeline,
    activity: Arc<DialogueActivity>,
    locks: ChatLocks,
}

impl EngagementEngine {
    pub fn new(
        config: &EngagementConfig,
        messages: Arc<dyn MessageStore>,
        summaries: Arc<dyn SummaryStore>,
        users: Arc<dyn UserStore>,
        chat_config: Arc<dyn ChatConfigSource>,
        completion: Arc<dyn CompletionService>,
    ) -> Result<Self> {
        config.validate()?;

        let activity = Arc::new(DialogueActivity::new(config.dialogue_timeout()));
        let interest = Arc::new(InterestBuffer::new());
        let sampler = Arc::new(InterestSampler::new(
            Arc::clone(&interest),
            Arc::clone(&completion),
            Arc::clone(&summaries),
            Arc::clone(&chat_config),
        ));
        let summarizer = Arc::new(HistorySummarizer::new(
            Arc::clone(&completion),
            Arc::clone(&messages),
            Arc::clone(&summaries),
            users,
        ));
        let pipeline =
            TriggerPipeline::standard(&config.identity, sampler, Arc::clone(&activity))?;

        Ok(Self {
            messages,
            summaries,
            chat_config,
            completion,
            interest,
            summarizer,
            pipeline,
            activity,
            locks: ChatLocks::new(),
        })
    }

    async fn memory(&self, chat_id: ChatId) -> ChatMemory {
        ChatMemory::open(
            chat_id,
            Arc::clone(&self.messages),
            Arc::clone(&self.interest),
            Arc::clone(&self.summarizer),
            Arc::clone(&self.chat_config),
            &self.locks,
        )
        .await
    }

    /// Process one inbound message: store it, evaluate triggers, and — on a
    /// match — generate and store the bot's answer.
    pub async fn handle_message(&self, event: &InboundEvent) -> Result<Option<Answer>> {
        let memory = self.memory(event.chat_id).await;
        memory.add_message(event.to_chat_message()).await?;

        let mut ctx = event.to_context();
        let Some(decision) = self.pipeline.should_respond(event, &mut ctx).await? else {
            return Ok(None);
        };

        let history = memory.get_history().await?;
        let summary = self.summaries.get_summary(event.chat_id).await?;
        let summary = (!summary.is_empty()).then_some(summary);
        let answer = self
            .completion
            .ask(&history, summary.as_deref(), decision.reason.as_ref())
            .await?;

        memory
            .add_message(ChatMessage::assistant(event.chat_id, answer.clone()))
            .await?;

        debug!(chat_id = event.chat_id, answer_len = answer.len(), "answer generated");
        Ok(Some(Answer {
            text: answer,
            reply_to: decision.reply_to,
        }))
    }

    /// Read-only activity check for callers that branch on it outside the
    /// pipeline.
    pub async fn is_active(&self, chat_id: ChatId) -> bool {
        self.activity.is_active(chat_id).await
    }
}
