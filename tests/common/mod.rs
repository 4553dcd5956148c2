#![allow(dead_code)]

//! Shared in-memory fakes for integration tests.

use async_trait::async_trait;
use barnacle::config::{BotIdentity, ChatConfig, EngagementConfig};
use barnacle::message::{ChatId, ChatMessage, InboundEvent, MessageId, ReplyInfo, TriggerReason, UserId};
use barnacle::ports::{
    AttitudeAssessment, AttitudePrior, ChatConfigSource, CompletionService, InterestSample,
    MessageStore, StoredUser, SummaryStore, UserStore,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const CHAT: ChatId = 100;

pub fn engagement_config() -> EngagementConfig {
    EngagementConfig {
        identity: BotIdentity {
            name: "Карл".to_string(),
            handle: "@carlbot".to_string(),
        },
        dialogue_timeout_s: 120,
    }
}

pub fn user_event(message_id: MessageId, user_id: UserId, username: &str, text: &str) -> InboundEvent {
    InboundEvent {
        chat_id: CHAT,
        message_id,
        user_id: Some(user_id),
        username: Some(username.to_string()),
        first_name: None,
        last_name: None,
        text: text.to_string(),
        reply: None,
        quote_text: None,
    }
}

pub fn reply_to_bot_event(message_id: MessageId, text: &str, replied_text: &str) -> InboundEvent {
    let mut event = user_event(message_id, 1, "alice", text);
    event.reply = Some(ReplyInfo {
        from_bot: true,
        username: None,
        text: replied_text.to_string(),
    });
    event
}

// ── Stores ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryMessages {
    chats: Mutex<HashMap<ChatId, Vec<ChatMessage>>>,
}

#[async_trait]
impl MessageStore for InMemoryMessages {
    async fn add_message(&self, msg: &ChatMessage) -> anyhow::Result<()> {
        let mut chats = self.chats.lock().await;
        chats.entry(msg.chat_id).or_default().push(msg.clone());
        Ok(())
    }

    async fn get_messages(&self, chat_id: ChatId) -> anyhow::Result<Vec<ChatMessage>> {
        let chats = self.chats.lock().await;
        Ok(chats.get(&chat_id).cloned().unwrap_or_default())
    }

    async fn get_count(&self, chat_id: ChatId) -> anyhow::Result<usize> {
        let chats = self.chats.lock().await;
        Ok(chats.get(&chat_id).map_or(0, Vec::len))
    }

    async fn get_last_messages(
        &self,
        chat_id: ChatId,
        limit: usize,
    ) -> anyhow::Result<Vec<ChatMessage>> {
        let chats = self.chats.lock().await;
        let Some(messages) = chats.get(&chat_id) else {
            return Ok(Vec::new());
        };
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn clear_messages(&self, chat_id: ChatId) -> anyhow::Result<()> {
        let mut chats = self.chats.lock().await;
        chats.remove(&chat_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySummaries {
    chats: Mutex<HashMap<ChatId, String>>,
}

#[async_trait]
impl SummaryStore for InMemorySummaries {
    async fn get_summary(&self, chat_id: ChatId) -> anyhow::Result<String> {
        let chats = self.chats.lock().await;
        Ok(chats.get(&chat_id).cloned().unwrap_or_default())
    }

    async fn set_summary(&self, chat_id: ChatId, summary: &str) -> anyhow::Result<()> {
        let mut chats = self.chats.lock().await;
        chats.insert(chat_id, summary.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    pub users: Mutex<HashMap<UserId, StoredUser>>,
}

#[async_trait]
impl UserStore for InMemoryUsers {
    async fn find_by_id(&self, user_id: UserId) -> anyhow::Result<Option<StoredUser>> {
        let users = self.users.lock().await;
        Ok(users.get(&user_id).cloned())
    }

    async fn set_attitude(&self, user_id: UserId, attitude: &str) -> anyhow::Result<()> {
        let mut users = self.users.lock().await;
        users.insert(
            user_id,
            StoredUser {
                user_id,
                attitude: Some(attitude.to_string()),
            },
        );
        Ok(())
    }
}

pub struct FixedConfigSource(pub ChatConfig);

#[async_trait]
impl ChatConfigSource for FixedConfigSource {
    async fn get_config(&self, _chat_id: ChatId) -> anyhow::Result<ChatConfig> {
        Ok(self.0)
    }
}

// ── Completion service ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AskCall {
    pub history_len: usize,
    pub summary: Option<String>,
    pub reason: Option<TriggerReason>,
}

/// Scripted completion fake: queued answers and interest verdicts, a fixed
/// summary output, and a record of every call for assertions.
#[derive(Default)]
pub struct ScriptedCompletion {
    pub ask_responses: Mutex<VecDeque<String>>,
    pub interest_verdicts: Mutex<VecDeque<Option<InterestSample>>>,
    pub summary_output: Mutex<String>,
    pub assessments: Mutex<Vec<AttitudeAssessment>>,
    pub fail_ask: Mutex<bool>,

    pub ask_calls: Mutex<Vec<AskCall>>,
    pub summarize_calls: Mutex<Vec<(Vec<String>, Option<String>)>>,
    pub interest_calls: Mutex<Vec<(Vec<MessageId>, String)>>,
    pub assess_calls: Mutex<Vec<Vec<AttitudePrior>>>,
}

impl ScriptedCompletion {
    pub async fn queue_answer(&self, answer: &str) {
        self.ask_responses.lock().await.push_back(answer.to_string());
    }

    pub async fn queue_interest(&self, verdict: Option<InterestSample>) {
        self.interest_verdicts.lock().await.push_back(verdict);
    }

    pub async fn set_summary_output(&self, summary: &str) {
        *self.summary_output.lock().await = summary.to_string();
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn ask(
        &self,
        history: &[ChatMessage],
        summary: Option<&str>,
        reason: Option<&TriggerReason>,
    ) -> anyhow::Result<String> {
        if *self.fail_ask.lock().await {
            anyhow::bail!("completion backend unavailable");
        }
        self.ask_calls.lock().await.push(AskCall {
            history_len: history.len(),
            summary: summary.map(String::from),
            reason: reason.cloned(),
        });
        let response = self.ask_responses.lock().await.pop_front();
        Ok(response.unwrap_or_else(|| "ok".to_string()))
    }

    async fn summarize(
        &self,
        history: &[ChatMessage],
        prev_summary: Option<&str>,
    ) -> anyhow::Result<String> {
        let contents = history.iter().map(|m| m.content.clone()).collect();
        self.summarize_calls
            .lock()
            .await
            .push((contents, prev_summary.map(String::from)));
        Ok(self.summary_output.lock().await.clone())
    }

    async fn check_interest(
        &self,
        window: &[ChatMessage],
        summary: &str,
    ) -> anyhow::Result<Option<InterestSample>> {
        let ids = window.iter().filter_map(|m| m.message_id).collect();
        self.interest_calls
            .lock()
            .await
            .push((ids, summary.to_string()));
        Ok(self
            .interest_verdicts
            .lock()
            .await
            .pop_front()
            .unwrap_or(None))
    }

    async fn assess_users(
        &self,
        _history: &[ChatMessage],
        priors: &[AttitudePrior],
    ) -> anyhow::Result<Vec<AttitudeAssessment>> {
        self.assess_calls.lock().await.push(priors.to_vec());
        Ok(self.assessments.lock().await.clone())
    }
}

// ── Engine fixture ──────────────────────────────────────────────

pub struct Fixture {
    pub messages: Arc<InMemoryMessages>,
    pub summaries: Arc<InMemorySummaries>,
    pub users: Arc<InMemoryUsers>,
    pub completion: Arc<ScriptedCompletion>,
    pub engine: barnacle::engine::EngagementEngine,
}

pub fn build_engine(history_limit: usize, interest_interval: usize) -> Fixture {
    let messages = Arc::new(InMemoryMessages::default());
    let summaries = Arc::new(InMemorySummaries::default());
    let users = Arc::new(InMemoryUsers::default());
    let completion = Arc::new(ScriptedCompletion::default());

    let engine = barnacle::engine::EngagementEngine::new(
        &engagement_config(),
        Arc::clone(&messages) as Arc<dyn MessageStore>,
        Arc::clone(&summaries) as Arc<dyn SummaryStore>,
        Arc::clone(&users) as Arc<dyn UserStore>,
        Arc::new(FixedConfigSource(ChatConfig {
            history_limit,
            interest_interval,
        })),
        Arc::clone(&completion) as Arc<dyn CompletionService>,
    )
    .expect("engine construction");

    Fixture {
        messages,
        summaries,
        users,
        completion,
        engine,
    }
}
