// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across Spectre crates.
//!
//! [`StoredMessage`] is the persistence schema for a history log. It is built
//! from an [`InboundEvent`] (or from an outbound reply) field by field and
//! never carries platform handles, so every stored turn can be read back
//! without a live connection.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Whether a conversation is a 1:1 chat or a group chat.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
}

/// Identifies one history log and one call-state entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub platform: String,
    pub kind: ChatKind,
    pub chat_id: String,
}

impl ConversationKey {
    pub fn new(platform: impl Into<String>, kind: ChatKind, chat_id: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            kind,
            chat_id: chat_id.into(),
        }
    }

    pub fn private(platform: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self::new(platform, ChatKind::Private, chat_id)
    }

    pub fn group(platform: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self::new(platform, ChatKind::Group, chat_id)
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.platform, self.kind, self.chat_id)
    }
}

/// One typed piece of message content.
///
/// Every kind except [`Segment::Text`] summarizes to a bracketed placeholder.
/// Adapters map platform segment kinds they do not recognize to
/// [`Segment::Other`], which renders as `[<kind>]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text {
        text: String,
    },
    Image {
        /// Local path, `file://` URL or remote URL of the image bytes.
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    Face {
        id: String,
    },
    At {
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    AtAll,
    Record,
    Video,
    Rps,
    Dice,
    Shake,
    Anonymous,
    Share {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    Contact {
        id: String,
    },
    Location {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    Music {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    RedBag {
        title: String,
    },
    Poke {
        target: String,
    },
    Forward,
    Node,
    Nodes,
    Xml,
    Json {
        data: String,
    },
    CardImage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
    Tts {
        text: String,
    },
    File {
        name: String,
    },
    WechatEmoji,
    Reply {
        sender_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_nickname: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        chain: Vec<Segment>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_str: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_str: Option<String>,
    },
    Other {
        kind: String,
    },
}

pub const IMAGE_PLACEHOLDER: &str = "[Image]";

/// Token the model emits in ambient-sensing mode to decline replying.
pub const NO_RESPONSE: &str = "<NO_RESPONSE>";

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    pub fn image(file: impl Into<String>) -> Self {
        Segment::Image {
            file: file.into(),
            url: None,
        }
    }

    /// Placeholder rendering that needs no collaborators. Images render as a
    /// bare `[Image]`; quoted replies recurse into their chain.
    pub fn outline(&self) -> String {
        match self {
            Segment::Text { text } => text.clone(),
            Segment::Image { .. } => IMAGE_PLACEHOLDER.to_string(),
            Segment::Face { id } => format!("[Face:{id}]"),
            Segment::At { target, name } => match name {
                Some(name) => format!("[At:{target}({name})]"),
                None => format!("[At:{target}]"),
            },
            Segment::AtAll => "[At:all members]".to_string(),
            Segment::Record => "[Voice]".to_string(),
            Segment::Video => "[Video]".to_string(),
            Segment::Rps => "[Rock-paper-scissors]".to_string(),
            Segment::Dice => "[Dice]".to_string(),
            Segment::Shake => "[Shake]".to_string(),
            Segment::Anonymous => "[Anonymous]".to_string(),
            Segment::Share { title, content } => {
                let content = content.as_deref().filter(|c| !c.is_empty());
                format!("[Share:\"{title}\"{}]", content.map(|c| format!(" {c}")).unwrap_or_default())
            }
            Segment::Contact { id } => format!("[Contact:{id}]"),
            Segment::Location { title, content } => {
                format!("[Location:{title}{}]", parenthesized(content.as_deref()))
            }
            Segment::Music { title, content } => {
                format!("[Music:{title}{}]", parenthesized(content.as_deref()))
            }
            Segment::RedBag { title } => format!("[Red packet:{title}]"),
            Segment::Poke { target } => format!("[Poke:{target}]"),
            Segment::Forward | Segment::Node | Segment::Nodes => {
                "[Forwarded messages]".to_string()
            }
            Segment::Xml => "[XML message]".to_string(),
            Segment::Json { data } => json_placeholder(data),
            Segment::CardImage { source } => {
                format!("[Card image:{}]", source.as_deref().unwrap_or(""))
            }
            Segment::Tts { text } => format!("[TTS:{text}]"),
            Segment::File { name } => format!("[File:{name}]"),
            Segment::WechatEmoji => "[WeChat emoji]".to_string(),
            Segment::Reply {
                sender_id,
                sender_nickname,
                chain,
                message_str,
                sender_str,
            } => {
                let quoted = (!chain.is_empty()).then(|| outline_segments(chain));
                reply_placeholder(
                    sender_id,
                    sender_nickname.as_deref(),
                    quoted.as_deref(),
                    message_str.as_deref(),
                    sender_str.as_deref(),
                )
            }
            Segment::Other { kind } => format!("[{kind}]"),
        }
    }
}

/// Concatenated [`Segment::outline`] of every segment.
pub fn outline_segments(segments: &[Segment]) -> String {
    segments.iter().map(Segment::outline).collect()
}

/// Render a quoted reply. `quoted` is the already summarized chain, if the
/// reply carried one; otherwise the flattened `message_str` is used, then the
/// bare `sender_str`.
pub fn reply_placeholder(
    sender_id: &str,
    sender_nickname: Option<&str>,
    quoted: Option<&str>,
    message_str: Option<&str>,
    sender_str: Option<&str>,
) -> String {
    let sender = match sender_nickname.filter(|n| !n.is_empty()) {
        Some(nick) => format!("{nick}({sender_id})"),
        None => sender_id.to_string(),
    };
    if let Some(body) = quoted.or(message_str.filter(|m| !m.is_empty())) {
        return format!("[Reply({sender}: {body})]");
    }
    match sender_str.filter(|s| !s.is_empty()) {
        Some(s) => format!("[Reply({s})]"),
        None => "[Reply]".to_string(),
    }
}

fn parenthesized(value: Option<&str>) -> String {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => format!("({v})"),
        None => String::new(),
    }
}

fn json_placeholder(data: &str) -> String {
    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(data)
    else {
        return "[JSON message]".to_string();
    };
    let field = |name: &str| {
        map.get(name).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    };
    if let Some(prompt) = field("prompt") {
        format!("[JSON card:{prompt}]")
    } else if let Some(app) = field("app") {
        format!("[Mini program:{app}]")
    } else {
        "[JSON message]".to_string()
    }
}

/// One persisted turn of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub sender_id: String,
    /// Nickname, or the sender id when the platform supplied none.
    pub sender_name: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub content: Vec<Segment>,
    #[serde(default)]
    pub bot_authored: bool,
}

impl StoredMessage {
    pub fn new(
        sender_id: impl Into<String>,
        sender_name: Option<String>,
        timestamp: i64,
        content: Vec<Segment>,
    ) -> Self {
        let sender_id = sender_id.into();
        let sender_name = display_name(sender_name.as_deref(), &sender_id);
        Self {
            sender_id,
            sender_name,
            timestamp,
            content,
            bot_authored: false,
        }
    }

    /// A turn authored by the bot itself.
    pub fn from_bot(
        self_id: impl Into<String>,
        alias: impl Into<String>,
        timestamp: i64,
        text: impl Into<String>,
    ) -> Self {
        let mut msg = Self::new(self_id, Some(alias.into()), timestamp, vec![Segment::text(text)]);
        msg.bot_authored = true;
        msg
    }

    pub fn outline(&self) -> String {
        outline_segments(&self.content)
    }

    /// Image references carried directly by this message, in order.
    pub fn image_refs(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|seg| match seg {
            Segment::Image { file, .. } => Some(file.as_str()),
            _ => None,
        })
    }
}

fn display_name(name: Option<&str>, id: &str) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n.to_string(),
        None => id.to_string(),
    }
}

/// A message delivered by the host platform.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub platform: String,
    pub kind: ChatKind,
    /// Group id for group chats, the counterpart's user id for private chats.
    pub chat_id: String,
    /// The bot's own account id on this platform.
    pub self_id: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub content: Vec<Segment>,
    pub timestamp: i64,
}

impl InboundEvent {
    pub fn key(&self) -> ConversationKey {
        ConversationKey::new(self.platform.clone(), self.kind, self.chat_id.clone())
    }

    pub fn outline(&self) -> String {
        outline_segments(&self.content)
    }

    /// Plain text of the message, ignoring every non-text segment.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|seg| match seg {
                Segment::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn to_stored(&self) -> StoredMessage {
        StoredMessage::new(
            self.sender_id.clone(),
            self.sender_name.clone(),
            self.timestamp,
            self.content.clone(),
        )
    }
}

/// Role of a seed conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A turn prepended to the model context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextTurn {
    pub role: Role,
    pub content: String,
}

/// A named system-prompt and style profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Persona {
    pub name: String,
    pub prompt: String,
    /// Example dialogs whose style the model should imitate.
    pub mood_dialogs: Option<String>,
    pub begin_dialogs: Vec<ContextTurn>,
}

/// Everything the model collaborator needs for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRequest {
    pub prompt: String,
    pub system_prompt: String,
    pub contexts: Vec<ContextTurn>,
    pub image_urls: Vec<String>,
    /// Whether the collaborator should expose its tool set to the model.
    pub use_tools: bool,
}
