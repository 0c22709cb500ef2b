// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply pipeline for Spectre.
//!
//! [`ReplyPipeline`] drives one inbound message through the whole flow:
//! - Records it in the conversation history
//! - Asks the [`DecisionEngine`] whether the bot should speak
//! - Holds the conversation's [`CallGuard`] for the model call
//! - Builds the prompt, invokes the model and filters its output
//! - Sends the reply and records it as the bot's own turn
//!
//! Nothing in here returns an error to the host. Every path ends in an
//! [`Outcome`].

pub mod call_state;
pub mod commands;
pub mod decision;
pub mod filter;
pub mod shutdown;
pub mod sweeper;

use std::sync::Arc;

use chrono::Utc;
use spectre_config::SpectreConfig;
use spectre_context::{PromptBuilder, PromptSettings, TranscriptFormatter};
use spectre_core::{
    ChatDirectory, ConversationKey, ImageCaptioner, InboundEvent, ModelProvider, PersonaRegistry,
    ReplySink, SpectreError, StoredMessage,
};
use spectre_storage::HistoryStore;
use tracing::{debug, info, warn};

pub use call_state::{CallGuard, CallState, CallStateTracker};
pub use commands::Command;
pub use decision::{Decision, DecisionEngine, ProbabilityPolicy, ReplyPolicy, ReplyReason, SkipReason};
pub use filter::{ResponseFilter, is_suppressed, strip_thinking};
pub use sweeper::spawn_image_sweeper;

/// How handling a message ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The model replied and the text was delivered.
    Replied(String),
    /// The model asked to stay silent.
    Suppressed,
    Skipped(SkipReason),
    /// Prompt assembly, the model call or delivery failed.
    Failed(String),
    /// An operator command ran; carries the text sent back.
    Command(String),
}

/// Collaborators the pipeline talks to.
pub struct Collaborators {
    pub provider: Arc<dyn ModelProvider>,
    pub captioner: Option<Arc<dyn ImageCaptioner>>,
    pub personas: Arc<dyn PersonaRegistry>,
    pub directory: Arc<dyn ChatDirectory>,
}

pub struct ReplyPipeline {
    config: Arc<SpectreConfig>,
    store: HistoryStore,
    tracker: Arc<CallStateTracker>,
    engine: DecisionEngine,
    builder: PromptBuilder,
    provider: Arc<dyn ModelProvider>,
    filter: ResponseFilter,
}

impl ReplyPipeline {
    pub fn new(config: Arc<SpectreConfig>, collaborators: Collaborators) -> Self {
        let store = HistoryStore::from_config(&config);
        let tracker = CallStateTracker::new();
        let engine = DecisionEngine::new(config.clone(), tracker.clone());
        let builder = PromptBuilder::new(
            store.clone(),
            TranscriptFormatter::new(collaborators.captioner),
            collaborators.personas,
            collaborators.directory,
            PromptSettings::from(config.as_ref()),
        );
        let filter = ResponseFilter::from(config.as_ref());

        info!(
            history_dir = %store.root().display(),
            provider = collaborators.provider.name(),
            "reply pipeline ready"
        );

        Self {
            config,
            store,
            tracker,
            engine,
            builder,
            provider: collaborators.provider,
            filter,
        }
    }

    /// Replace the fallback reply policy.
    pub fn with_policy(mut self, policy: Box<dyn ReplyPolicy>) -> Self {
        self.engine = DecisionEngine::with_policy(self.config.clone(), self.tracker.clone(), policy);
        self
    }

    pub fn config(&self) -> &SpectreConfig {
        &self.config
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn tracker(&self) -> &Arc<CallStateTracker> {
        &self.tracker
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Record an inbound message. Messages from conversations without
    /// history enabled are dropped; returns whether the message was stored.
    pub async fn on_inbound(&self, event: &InboundEvent) -> bool {
        let key = event.key();
        if !spectre_storage::is_enabled(&key, &self.config) {
            debug!(conversation = %key, "history disabled, message not stored");
            return false;
        }
        self.store.append(&key, event.to_stored()).await
    }

    /// Record a reply the bot sent into `event`'s conversation.
    pub async fn record_outbound(&self, event: &InboundEvent, text: &str) -> bool {
        let key = event.key();
        if !spectre_storage::is_enabled(&key, &self.config) {
            return false;
        }
        let message = StoredMessage::from_bot(
            event.self_id.clone(),
            self.config.bot.history_alias.clone(),
            Utc::now().timestamp(),
            text,
        );
        self.store.append(&key, message).await
    }

    /// Build the prompt, call the model and filter its answer.
    ///
    /// `Ok(None)` means the model chose not to reply.
    pub async fn invoke(&self, event: &InboundEvent) -> Result<Option<String>, SpectreError> {
        let key = event.key();
        let request = self.builder.build(event).await?;
        debug!(
            conversation = %key,
            prompt_len = request.prompt.len(),
            images = request.image_urls.len(),
            "invoking model"
        );
        let raw = self.provider.invoke(request).await?;
        let filtered = self.filter.process(&raw);
        if is_suppressed(&filtered) {
            info!(conversation = %key, "model declined to reply");
            return Ok(None);
        }
        Ok(Some(filtered))
    }

    /// Run the full flow for an ordinary chat message.
    pub async fn handle(&self, event: &InboundEvent, sink: &dyn ReplySink) -> Outcome {
        self.on_inbound(event).await;

        let key = event.key();
        match self.engine.evaluate(event) {
            Decision::Skip(reason) => return Outcome::Skipped(reason),
            Decision::Reply(reason) => debug!(conversation = %key, %reason, "replying"),
        }

        // The flag may have been taken since the decision was made.
        let Some(guard) = self.tracker.try_acquire(&key) else {
            return Outcome::Skipped(SkipReason::InProgress);
        };
        self.respond(event, sink, guard).await
    }

    /// Handle operator commands, falling back to [`handle`](Self::handle).
    pub async fn dispatch(&self, event: &InboundEvent, sink: &dyn ReplySink) -> Outcome {
        let Some(command) = Command::parse(&event.plain_text()) else {
            return self.handle(event, sink).await;
        };
        let key = event.key();
        debug!(conversation = %key, ?command, "operator command");

        let text = match command {
            Command::CallLlm => return self.force_reply(event, sink).await,
            Command::Help => commands::HELP_TEXT.to_string(),
            Command::History { count } => {
                commands::history_report(&self.store, self.builder.formatter(), event, count).await
            }
            Command::Reset { group_id } => {
                commands::reset_report(&self.store, &self.tracker, event, group_id.as_deref())
                    .await
            }
        };

        match sink.send(&key, &text).await {
            Ok(()) => Outcome::Command(text),
            Err(e) => {
                warn!(conversation = %key, error = %e, "failed to deliver command reply");
                Outcome::Failed(e.to_string())
            }
        }
    }

    /// Invoke the model regardless of the reply decision. The call-state
    /// guard still applies.
    pub async fn force_reply(&self, event: &InboundEvent, sink: &dyn ReplySink) -> Outcome {
        let key = event.key();
        let Some(guard) = self.tracker.try_acquire(&key) else {
            return Outcome::Skipped(SkipReason::InProgress);
        };
        let outcome = self.respond(event, sink, guard).await;
        if let Outcome::Failed(reason) = &outcome {
            let apology = format!("Failed to trigger a model reply: {reason}");
            if let Err(e) = sink.send(&key, &apology).await {
                warn!(conversation = %key, error = %e, "failed to deliver error notice");
            }
        }
        outcome
    }

    /// Clear a conversation's history and call state.
    pub async fn reset(&self, key: &ConversationKey) -> bool {
        let cleared = self.store.clear(key).await;
        self.tracker.clear(key);
        cleared
    }

    async fn respond(&self, event: &InboundEvent, sink: &dyn ReplySink, guard: CallGuard) -> Outcome {
        let key = guard.key().clone();
        let text = match self.invoke(event).await {
            Ok(Some(text)) => text,
            Ok(None) => return Outcome::Suppressed,
            Err(e) => {
                warn!(conversation = %key, error = %e, "model reply aborted");
                return Outcome::Failed(e.to_string());
            }
        };

        if let Err(e) = sink.send(&key, &text).await {
            warn!(conversation = %key, error = %e, "failed to deliver reply");
            return Outcome::Failed(e.to_string());
        }
        self.record_outbound(event, &text).await;
        drop(guard);
        Outcome::Replied(text)
    }
}
