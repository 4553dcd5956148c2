//! Reply triggers and their evaluation pipeline.
//!
//! Each trigger is a predicate plus an optional rewrite of the normalized
//! message text. The pipeline evaluates a fixed, explicitly ordered list —
//! evaluation order is a correctness property, so there is no dynamic
//! registration — and the first match short-circuits the rest.

use crate::activity::DialogueActivity;
use crate::config::BotIdentity;
use crate::interest::InterestSampler;
use crate::message::{InboundEvent, MessageContext, TriggerDecision, TriggerReason};
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// A strategy deciding whether an inbound message should produce a reply.
///
/// `apply` returns `Some` on a match (possibly rewriting `ctx.text`, e.g. to
/// strip an address prefix) and `None` otherwise. Only one trigger is expected
/// to match per evaluation pass.
#[async_trait]
pub trait Trigger: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(
        &self,
        event: &InboundEvent,
        ctx: &mut MessageContext,
    ) -> Result<Option<TriggerDecision>>;
}

/// Matches the bot's platform handle anywhere in the text and strips it.
pub struct MentionTrigger {
    handle: String,
    handle_lower: String,
}

impl MentionTrigger {
    /// `handle` must be ASCII (validated at the config boundary) so that
    /// lowercased byte offsets map back onto the original text.
    pub fn new(handle: impl Into<String>) -> Self {
        let handle = handle.into();
        let handle_lower = handle.to_ascii_lowercase();
        Self {
            handle,
            handle_lower,
        }
    }
}

#[async_trait]
impl Trigger for MentionTrigger {
    fn name(&self) -> &'static str {
        "mention"
    }

    async fn apply(
        &self,
        _event: &InboundEvent,
        ctx: &mut MessageContext,
    ) -> Result<Option<TriggerDecision>> {
        let Some(pos) = ctx.text.to_ascii_lowercase().find(&self.handle_lower) else {
            return Ok(None);
        };

        let mut stripped = String::with_capacity(ctx.text.len());
        stripped.push_str(&ctx.text[..pos]);
        stripped.push_str(&ctx.text[pos + self.handle.len()..]);
        ctx.text = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

        Ok(Some(TriggerDecision::default()))
    }
}

/// Matches a platform-level reply to a message the bot itself sent.
pub struct ReplyTrigger;

#[async_trait]
impl Trigger for ReplyTrigger {
    fn name(&self) -> &'static str {
        "reply_to_bot"
    }

    async fn apply(
        &self,
        event: &InboundEvent,
        _ctx: &mut MessageContext,
    ) -> Result<Option<TriggerDecision>> {
        if event.reply.as_ref().is_some_and(|reply| reply.from_bot) {
            Ok(Some(TriggerDecision::default()))
        } else {
            Ok(None)
        }
    }
}

/// Matches the bot's display name as a case-insensitive message prefix
/// ("Карл, привет") and strips it. The name must anchor at the start —
/// a trailing "привет Карл" is not an address.
pub struct NamePrefixTrigger {
    pattern: Regex,
}

impl NamePrefixTrigger {
    pub fn new(name: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(r"(?i)^{}[,:\s]\s*", regex::escape(name)))
            .with_context(|| format!("invalid bot name pattern for {:?}", name))?;
        Ok(Self { pattern })
    }
}

#[async_trait]
impl Trigger for NamePrefixTrigger {
    fn name(&self) -> &'static str {
        "name_prefix"
    }

    async fn apply(
        &self,
        _event: &InboundEvent,
        ctx: &mut MessageContext,
    ) -> Result<Option<TriggerDecision>> {
        let Some(matched) = self.pattern.find(&ctx.text) else {
            return Ok(None);
        };
        ctx.text = ctx.text[matched.end()..].to_string();
        Ok(Some(TriggerDecision::default()))
    }
}

/// Delegates to [`InterestSampler`] when the dialogue is not already active —
/// the bot should not interrupt an ongoing exchange with a proactive nudge.
pub struct InterestTrigger {
    sampler: Arc<InterestSampler>,
    activity: Arc<DialogueActivity>,
}

impl InterestTrigger {
    pub fn new(sampler: Arc<InterestSampler>, activity: Arc<DialogueActivity>) -> Self {
        Self { sampler, activity }
    }
}

#[async_trait]
impl Trigger for InterestTrigger {
    fn name(&self) -> &'static str {
        "interest"
    }

    async fn apply(
        &self,
        event: &InboundEvent,
        _ctx: &mut MessageContext,
    ) -> Result<Option<TriggerDecision>> {
        if self.activity.is_active(event.chat_id).await {
            return Ok(None);
        }

        let Some(hit) = self.sampler.check(event.chat_id).await? else {
            return Ok(None);
        };

        Ok(Some(TriggerDecision {
            reply_to: Some(hit.message_id),
            reason: Some(TriggerReason {
                message: hit.message,
                why: hit.why,
            }),
        }))
    }
}

/// Orchestrates trigger evaluation and dialogue-activity transitions.
pub struct TriggerPipeline {
    triggers: Vec<Arc<dyn Trigger>>,
    activity: Arc<DialogueActivity>,
}

impl TriggerPipeline {
    /// Build a pipeline over an explicit trigger order. Prefer
    /// [`TriggerPipeline::standard`] outside of tests.
    pub fn new(triggers: Vec<Arc<dyn Trigger>>, activity: Arc<DialogueActivity>) -> Self {
        Self { triggers, activity }
    }

    /// The production order: mention, reply-to-bot, name-prefix, interest.
    pub fn standard(
        identity: &BotIdentity,
        sampler: Arc<InterestSampler>,
        activity: Arc<DialogueActivity>,
    ) -> Result<Self> {
        let triggers: Vec<Arc<dyn Trigger>> = vec![
            Arc::new(MentionTrigger::new(identity.handle.clone())),
            Arc::new(ReplyTrigger),
            Arc::new(NamePrefixTrigger::new(&identity.name)?),
            Arc::new(InterestTrigger::new(sampler, Arc::clone(&activity))),
        ];
        Ok(Self::new(triggers, activity))
    }

    /// Evaluate triggers in order, stopping at the first match.
    ///
    /// On a match the dialogue window is advanced forward — extended when the
    /// chat is already active, started otherwise. A non-match never touches
    /// activity state, even while a dialogue is in progress.
    pub async fn should_respond(
        &self,
        event: &InboundEvent,
        ctx: &mut MessageContext,
    ) -> Result<Option<TriggerDecision>> {
        for trigger in &self.triggers {
            let Some(decision) = trigger.apply(event, ctx).await? else {
                continue;
            };
            debug!(
                chat_id = event.chat_id,
                trigger = trigger.name(),
                "trigger matched"
            );

            if self.activity.is_active(event.chat_id).await {
                self.activity.extend(event.chat_id).await;
            } else {
                self.activity.start(event.chat_id).await;
            }
            return Ok(Some(decision));
        }

        debug!(chat_id = event.chat_id, "no trigger matched");
        Ok(None)
    }
}
