// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly for Spectre.
//!
//! A [`ModelRequest`] is assembled from four parts:
//! - **Scene**: who the bot is and which chat it is looking at
//! - **Transcript**: the most recent history entries, or a "no history" note
//! - **Closing**: reply instructions, including the `<NO_RESPONSE>` escape
//!   hatch in ambient-sensing mode
//! - **Persona**: system prompt, style examples and seed turns
//!
//! Images from the same transcript window are attached newest first, up to
//! the configured count.

pub mod persona;
pub mod scene;
pub mod transcript;

use std::sync::Arc;

use spectre_config::SpectreConfig;
use spectre_core::{
    ChatDirectory, InboundEvent, ModelRequest, NO_RESPONSE, PersonaRegistry, SpectreError,
    StoredMessage,
};
use spectre_storage::HistoryStore;
use tracing::{debug, error};

pub use persona::PersonaZone;
pub use scene::scene_preamble;
pub use transcript::{DIVIDER, TranscriptFormatter, format_timestamp};

/// Sentence embedded when a conversation has no history yet.
pub const NO_HISTORY_NOTE: &str =
    "You have not seen any chat history; it looks like nobody has said anything recently.";

const HISTORY_HEADER: &str = "Here is the recent chat history:\n";

/// Prompt knobs taken from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSettings {
    /// Transcript window size.
    pub history_limit: usize,
    pub read_air: bool,
    pub use_tools: bool,
    /// Persona name; empty for none.
    pub persona: String,
    /// Maximum images attached; zero disables attachment.
    pub image_count: usize,
    /// Name the bot's own turns carry in history.
    pub history_alias: String,
}

impl From<&SpectreConfig> for PromptSettings {
    fn from(config: &SpectreConfig) -> Self {
        Self {
            history_limit: config.group_msg_history,
            read_air: config.read_air,
            use_tools: config.use_func_tool,
            persona: config.persona.clone(),
            image_count: config.image_processing.image_count,
            history_alias: config.bot.history_alias.clone(),
        }
    }
}

/// Builds model requests for a conversation from its stored history.
pub struct PromptBuilder {
    store: HistoryStore,
    formatter: TranscriptFormatter,
    personas: Arc<dyn PersonaRegistry>,
    directory: Arc<dyn ChatDirectory>,
    settings: PromptSettings,
}

impl PromptBuilder {
    pub fn new(
        store: HistoryStore,
        formatter: TranscriptFormatter,
        personas: Arc<dyn PersonaRegistry>,
        directory: Arc<dyn ChatDirectory>,
        settings: PromptSettings,
    ) -> Self {
        Self {
            store,
            formatter,
            personas,
            directory,
            settings,
        }
    }

    pub fn settings(&self) -> &PromptSettings {
        &self.settings
    }

    pub fn formatter(&self) -> &TranscriptFormatter {
        &self.formatter
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Assemble the request for `event`'s conversation.
    ///
    /// Fails without producing a partial request if history cannot be read.
    pub async fn build(&self, event: &InboundEvent) -> Result<ModelRequest, SpectreError> {
        let key = event.key();
        let mut prompt = scene_preamble(event, self.directory.as_ref()).await;

        let history = self.store.try_read(&key).await.inspect_err(|e| {
            error!(conversation = %key, error = %e, "failed to load history for prompt");
        })?;
        let window = transcript_window(&history, self.settings.history_limit);

        if window.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(NO_HISTORY_NOTE);
        } else {
            prompt.push_str("\n\n");
            prompt.push_str(HISTORY_HEADER);
            prompt.push_str(&self.formatter.render(window, window.len()).await);
        }

        prompt.push_str(&closing_block(&self.settings));

        let persona = PersonaZone::resolve(self.personas.as_ref(), &self.settings.persona);

        let image_urls = collect_images(window, self.settings.image_count);
        if !image_urls.is_empty() {
            prompt.push_str(&format!(
                "\n\n{} image(s) from the chat history are attached, ordered from newest to oldest. \
                 You can look at them directly; they appeared in the chat history above.",
                image_urls.len()
            ));
        }

        debug!(
            conversation = %key,
            history = window.len(),
            images = image_urls.len(),
            persona = !persona.system_prompt.is_empty(),
            "model request built"
        );

        Ok(ModelRequest {
            prompt,
            system_prompt: persona.system_prompt,
            contexts: persona.contexts,
            image_urls,
            use_tools: self.settings.use_tools,
        })
    }
}

/// The last `limit` entries of a log.
pub fn transcript_window(history: &[StoredMessage], limit: usize) -> &[StoredMessage] {
    &history[history.len().saturating_sub(limit)..]
}

/// Up to `quota` image references from `window`, newest message first.
pub fn collect_images(window: &[StoredMessage], quota: usize) -> Vec<String> {
    if quota == 0 {
        return Vec::new();
    }
    let mut images = Vec::new();
    for message in window.iter().rev() {
        for image in message.image_refs().filter(|r| !r.is_empty()) {
            images.push(image.to_string());
            if images.len() >= quota {
                return images;
            }
        }
    }
    images
}

fn closing_block(settings: &PromptSettings) -> String {
    let mut text = format!(
        "\n(In the chat history, your username has been replaced with {})\
         \n(If you want to reply to someone, do not use a format like [At:id(nickname)])",
        settings.history_alias
    );
    if settings.read_air {
        text.push_str(&format!(
            "\n\nYour reaction:\n(If you want to send a message, output its content directly. \
             If you choose to ignore the conversation, output {NO_RESPONSE} and nothing else)"
        ));
    } else {
        text.push_str("\n\nYou decided to send a message (your output will be sent as the message)");
    }
    text
}
