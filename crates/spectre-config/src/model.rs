// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Spectre.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use spectre_core::{ChatKind, ContextTurn, ConversationKey, Persona};
use strum::Display;

/// Smallest and largest accepted image retention, in days.
pub const RETENTION_DAYS_RANGE: (i64, i64) = (1, 365);

/// Top-level Spectre configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// Every key is optional and defaults to a sensible value.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpectreConfig {
    /// Record history and consider replying in private chats.
    #[serde(default)]
    pub enabled_private: bool,

    /// Group chat ids allowed to record history and receive replies.
    #[serde(default)]
    pub enabled_groups: Vec<String>,

    /// Number of most recent history entries embedded in a prompt.
    #[serde(default = "default_group_msg_history")]
    pub group_msg_history: usize,

    /// Ambient-sensing mode: the model may answer `<NO_RESPONSE>` to stay silent.
    #[serde(default)]
    pub read_air: bool,

    /// Strip a leading `<think>...</think>` block from model output.
    #[serde(default = "default_true")]
    pub filter_thinking: bool,

    /// Let the model collaborator expose its tools.
    #[serde(default)]
    pub use_func_tool: bool,

    /// Name of the persona to apply. Empty disables persona injection.
    #[serde(default)]
    pub persona: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub model_frequency: ModelFrequencyConfig,

    #[serde(default)]
    pub image_processing: ImageProcessingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub bot: BotConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub captioner: CaptionerConfig,

    /// Personas available by name.
    #[serde(default)]
    pub personas: Vec<PersonaConfig>,
}

impl Default for SpectreConfig {
    fn default() -> Self {
        Self {
            enabled_private: false,
            enabled_groups: Vec::new(),
            group_msg_history: default_group_msg_history(),
            read_air: false,
            filter_thinking: true,
            use_func_tool: false,
            persona: String::new(),
            log_level: default_log_level(),
            model_frequency: ModelFrequencyConfig::default(),
            image_processing: ImageProcessingConfig::default(),
            storage: StorageConfig::default(),
            bot: BotConfig::default(),
            provider: ProviderConfig::default(),
            captioner: CaptionerConfig::default(),
            personas: Vec::new(),
        }
    }
}

impl SpectreConfig {
    /// Whether history recording and replies are switched on for a conversation.
    /// Private chats share one flag; group chats need an allow-list entry.
    pub fn is_enabled(&self, key: &ConversationKey) -> bool {
        match key.kind {
            ChatKind::Private => self.enabled_private,
            ChatKind::Group => self.enabled_groups.iter().any(|g| g == &key.chat_id),
        }
    }

    pub fn personas(&self) -> Vec<Persona> {
        self.personas.iter().cloned().map(Persona::from).collect()
    }
}

fn default_group_msg_history() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Policy used when no keyword decides the outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReplyMethod {
    /// Reply with a fixed probability per message.
    #[default]
    #[serde(alias = "概率回复")]
    Probability,
}

/// Reply decision settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelFrequencyConfig {
    #[serde(default)]
    pub method: ReplyMethod,

    /// Messages containing any of these always get a reply.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Messages containing any of these never get a reply.
    #[serde(default)]
    pub blacklist_keywords: Vec<String>,

    #[serde(default)]
    pub probability: ProbabilityConfig,
}

/// Settings for [`ReplyMethod::Probability`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProbabilityConfig {
    /// Chance in `[0, 1]` of replying to a message.
    #[serde(default = "default_probability")]
    pub probability: f64,
}

impl Default for ProbabilityConfig {
    fn default() -> Self {
        Self {
            probability: default_probability(),
        }
    }
}

fn default_probability() -> f64 {
    0.1
}

/// Image persistence and prompt attachment settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImageProcessingConfig {
    /// Copy inbound images into the image vault before they are stored.
    #[serde(default = "default_true")]
    pub enable_image_persistence: bool,

    /// Age after which persisted images are swept. Clamped to 1..=365.
    #[serde(default = "default_image_retention_days")]
    pub image_retention_days: i64,

    /// Maximum images attached to a model request. Zero disables attachment.
    #[serde(default)]
    pub image_count: usize,

    /// Period of the background image sweeper.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for ImageProcessingConfig {
    fn default() -> Self {
        Self {
            enable_image_persistence: true,
            image_retention_days: default_image_retention_days(),
            image_count: 0,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl ImageProcessingConfig {
    /// Retention window in days, clamped into the accepted range.
    pub fn retention_days(&self) -> u64 {
        let (min, max) = RETENTION_DAYS_RANGE;
        self.image_retention_days.clamp(min, max) as u64
    }
}

fn default_image_retention_days() -> i64 {
    7
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

/// On-disk locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Root of the history tree: `<history_dir>/<platform>/<private|group>/<id>.json`.
    #[serde(default = "default_history_dir")]
    pub history_dir: String,

    /// Directory holding persisted images. Defaults to `<history_dir>/images`.
    #[serde(default)]
    pub images_dir: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_dir: default_history_dir(),
            images_dir: None,
        }
    }
}

impl StorageConfig {
    pub fn history_path(&self) -> PathBuf {
        PathBuf::from(&self.history_dir)
    }

    pub fn images_path(&self) -> PathBuf {
        match &self.images_dir {
            Some(dir) => PathBuf::from(dir),
            None => self.history_path().join("images"),
        }
    }
}

fn default_history_dir() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("spectre").join("chat_history"))
        .unwrap_or_else(|| PathBuf::from("data").join("chat_history"))
        .display()
        .to_string()
}

/// How the bot refers to itself.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Sender name recorded for the bot's own turns in history.
    #[serde(default = "default_history_alias")]
    pub history_alias: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            history_alias: default_history_alias(),
        }
    }
}

fn default_history_alias() -> String {
    "Spectre".to_string()
}

/// OpenAI-compatible chat completion endpoint used for replies.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. `None` sends unauthenticated requests.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on 429/500/503 before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    1
}

/// Vision model used to caption images in transcripts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CaptionerConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Endpoint root. Falls back to `provider.base_url`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Falls back to `provider.api_key`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_caption_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_caption_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CaptionerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: None,
            api_key: None,
            model: default_model(),
            system_prompt: default_caption_prompt(),
            timeout_secs: default_caption_timeout_secs(),
        }
    }
}

fn default_caption_prompt() -> String {
    "Describe this image in one short sentence.".to_string()
}

fn default_caption_timeout_secs() -> u64 {
    60
}

/// A persona entry in `[[personas]]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PersonaConfig {
    pub name: String,

    #[serde(default)]
    pub prompt: String,

    /// Example dialogs to imitate (`a` lines are users, `b` lines are the bot).
    #[serde(default)]
    pub mood_dialogs: Option<String>,

    /// Turns prepended to every model context.
    #[serde(default)]
    pub begin_dialogs: Vec<ContextTurn>,
}

impl From<PersonaConfig> for Persona {
    fn from(cfg: PersonaConfig) -> Self {
        Persona {
            name: cfg.name,
            prompt: cfg.prompt,
            mood_dialogs: cfg.mood_dialogs.filter(|d| !d.trim().is_empty()),
            begin_dialogs: cfg.begin_dialogs,
        }
    }
}
