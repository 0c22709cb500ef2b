// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end tests.
//!
//! `TestHarness` wires a complete [`ReplyPipeline`] with mock collaborators
//! and a temporary history directory. Group `100` and all private chats are
//! enabled by default.

use std::sync::Arc;

use spectre_agent::{Collaborators, Outcome, ProbabilityPolicy, ReplyPipeline};
use spectre_config::SpectreConfig;
use spectre_core::{
    ChatKind, ConversationKey, ImageCaptioner, InboundEvent, Persona, Segment, SpectreError,
    StaticPersonas, StoredMessage,
};
use spectre_storage::HistoryStore;

use crate::mock_platform::{MockDirectory, MockSink};
use crate::mock_provider::MockProvider;

pub const PLATFORM: &str = "test";
pub const GROUP_ID: &str = "100";
pub const SELF_ID: &str = "10000";

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    roll: f64,
    config: SpectreConfig,
    personas: Vec<Persona>,
    captioner: Option<Arc<dyn ImageCaptioner>>,
    directory: MockDirectory,
    provider: Option<MockProvider>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let config = SpectreConfig {
            enabled_private: true,
            enabled_groups: vec![GROUP_ID.to_string()],
            ..SpectreConfig::default()
        };
        Self {
            responses: Vec::new(),
            // Above the default probability, so only keywords trigger replies.
            roll: 0.99,
            config,
            personas: Vec::new(),
            captioner: None,
            directory: MockDirectory::new(),
            provider: None,
        }
    }

    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Use a prepared provider instead of one built from the response list.
    pub fn with_provider(mut self, provider: MockProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Fix the value the probability policy rolls.
    pub fn with_roll(mut self, roll: f64) -> Self {
        self.roll = roll;
        self
    }

    /// Make the probability policy accept every message.
    pub fn always_reply(self) -> Self {
        self.with_roll(-1.0)
    }

    pub fn configure(mut self, f: impl FnOnce(&mut SpectreConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.personas.push(persona);
        self
    }

    pub fn with_captioner(mut self, captioner: Arc<dyn ImageCaptioner>) -> Self {
        self.captioner = Some(captioner);
        self
    }

    pub fn with_directory(mut self, directory: MockDirectory) -> Self {
        self.directory = directory;
        self
    }

    pub fn build(self) -> Result<TestHarness, SpectreError> {
        let temp_dir = tempfile::TempDir::new()?;
        let mut config = self.config;
        config.storage.history_dir = temp_dir.path().join("history").display().to_string();
        config.storage.images_dir = Some(temp_dir.path().join("images").display().to_string());

        let mock_provider = Arc::new(
            self.provider
                .unwrap_or_else(|| MockProvider::with_responses(self.responses)),
        );
        let mock_sink = Arc::new(MockSink::new());
        let probability = config.model_frequency.probability.probability;
        let roll = self.roll;

        let pipeline = ReplyPipeline::new(
            Arc::new(config),
            Collaborators {
                provider: mock_provider.clone(),
                captioner: self.captioner,
                personas: Arc::new(StaticPersonas::new(self.personas)),
                directory: Arc::new(self.directory),
            },
        )
        .with_policy(Box::new(ProbabilityPolicy::with_roll(probability, move || roll)));

        Ok(TestHarness {
            pipeline,
            mock_provider,
            mock_sink,
            _temp_dir: temp_dir,
        })
    }
}

/// A ready-to-drive pipeline plus handles to its mocks.
pub struct TestHarness {
    pub pipeline: ReplyPipeline,
    pub mock_provider: Arc<MockProvider>,
    pub mock_sink: Arc<MockSink>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A text message from `sender_id` in the default group.
    pub fn group_event(sender_id: &str, text: &str) -> InboundEvent {
        Self::event(ChatKind::Group, GROUP_ID, sender_id, vec![Segment::text(text)])
    }

    /// A text message in a private chat with `sender_id`.
    pub fn private_event(sender_id: &str, text: &str) -> InboundEvent {
        Self::event(ChatKind::Private, sender_id, sender_id, vec![Segment::text(text)])
    }

    pub fn event(
        kind: ChatKind,
        chat_id: &str,
        sender_id: &str,
        content: Vec<Segment>,
    ) -> InboundEvent {
        InboundEvent {
            platform: PLATFORM.to_string(),
            kind,
            chat_id: chat_id.to_string(),
            self_id: SELF_ID.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: Some(format!("user{sender_id}")),
            content,
            timestamp: 1_700_000_000,
        }
    }

    pub fn group_key() -> ConversationKey {
        ConversationKey::group(PLATFORM, GROUP_ID)
    }

    /// Drive one message through command dispatch and the reply flow.
    pub async fn send(&self, event: &InboundEvent) -> Outcome {
        self.pipeline.dispatch(event, self.mock_sink.as_ref()).await
    }

    pub fn store(&self) -> &HistoryStore {
        self.pipeline.store()
    }

    pub async fn history(&self, key: &ConversationKey) -> Vec<StoredMessage> {
        self.store().read(key).await
    }
}
