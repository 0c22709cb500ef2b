// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator commands addressed to the bot inside a chat.
//!
//! A command is a plain-text message starting with `spectrecore` or its
//! alias `sc`, optionally preceded by `/`:
//!
//! ```text
//! /sc help
//! /sc history 5
//! /sc reset 123456
//! /spectrecore callllm
//! ```

use spectre_context::TranscriptFormatter;
use spectre_core::{ChatKind, ConversationKey, InboundEvent};
use spectre_storage::HistoryStore;
use tracing::{info, warn};

use crate::call_state::CallStateTracker;

const PREFIXES: [&str; 2] = ["spectrecore", "sc"];

pub const DEFAULT_HISTORY_COUNT: usize = 10;
pub const MAX_HISTORY_COUNT: usize = 20;

pub const HELP_TEXT: &str = "\
Spectre help
Use spectrecore or sc as the command prefix, e.g. /sc help
/sc reset            clear the history of this chat
/sc reset <group_id> clear the history of another group
/sc history [count]  show recent messages (default 10, at most 20)
/sc callllm          ask the model for a reply right now";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    History { count: usize },
    Reset { group_id: Option<String> },
    CallLlm,
}

impl Command {
    /// Parse `text` as a command. Returns `None` when the message is not
    /// addressed to the command group at all.
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();
        let text = text.strip_prefix('/').unwrap_or(text);
        let mut words = text.split_whitespace();
        let head = words.next()?;
        if !PREFIXES.iter().any(|p| head.eq_ignore_ascii_case(p)) {
            return None;
        }

        let command = match words.next().map(str::to_ascii_lowercase).as_deref() {
            Some("history") => {
                let count = words
                    .next()
                    .and_then(|w| w.parse::<usize>().ok())
                    .unwrap_or(DEFAULT_HISTORY_COUNT);
                Command::History {
                    count: count.clamp(1, MAX_HISTORY_COUNT),
                }
            }
            Some("reset") => Command::Reset {
                group_id: words.next().map(str::to_string),
            },
            Some("callllm") => Command::CallLlm,
            _ => Command::Help,
        };
        Some(command)
    }
}

fn describe(key: &ConversationKey) -> String {
    match key.kind {
        ChatKind::Private => "private chat".to_string(),
        ChatKind::Group => format!("group chat ({})", key.chat_id),
    }
}

/// Recent history of the event's conversation, rendered for display.
pub async fn history_report(
    store: &HistoryStore,
    formatter: &TranscriptFormatter,
    event: &InboundEvent,
    count: usize,
) -> String {
    if event.chat_id.is_empty() {
        return "Could not determine the chat id, no history to show.".to_string();
    }
    let key = event.key();
    let history = match store.try_read(&key).await {
        Ok(history) => history,
        Err(e) => {
            warn!(conversation = %key, error = %e, "history command failed");
            return format!("Failed to load chat history: {e}");
        }
    };
    if history.is_empty() {
        return "No chat history yet.".to_string();
    }

    let shown = history.len().min(count);
    let body = formatter.render(&history, shown).await;
    let heading = match shown {
        1 => "Last message".to_string(),
        n => format!("Last {n} messages"),
    };
    format!("{heading} of the {}:\n\n{body}", describe(&key))
}

/// Clear history and call state of the event's conversation, or of
/// `group_id` on the same platform when one is given.
pub async fn reset_report(
    store: &HistoryStore,
    tracker: &CallStateTracker,
    event: &InboundEvent,
    group_id: Option<&str>,
) -> String {
    let key = match group_id {
        Some(id) => ConversationKey::group(event.platform.clone(), id),
        None if event.chat_id.is_empty() => {
            return "Could not determine the chat id, nothing was reset.".to_string();
        }
        None => event.key(),
    };
    let label = describe(&key);

    if store.read(&key).await.is_empty() {
        return format!("The {label} has no history, nothing to reset.");
    }
    if !store.clear(&key).await {
        return format!("Failed to reset the history of the {label}.");
    }
    tracker.clear(&key);
    info!(conversation = %key, "history reset by command");
    format!("History of the {label} has been reset.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectre_core::{Segment, StoredMessage};

    #[test]
    fn parses_prefixes_and_subcommands() {
        assert_eq!(Command::parse("/sc help"), Some(Command::Help));
        assert_eq!(Command::parse("spectrecore"), Some(Command::Help));
        assert_eq!(Command::parse("  /SC   callllm "), Some(Command::CallLlm));
        assert_eq!(Command::parse("sc unknown"), Some(Command::Help));
        assert_eq!(
            Command::parse("/sc reset 123456"),
            Some(Command::Reset {
                group_id: Some("123456".into())
            })
        );
        assert_eq!(
            Command::parse("/sc reset"),
            Some(Command::Reset { group_id: None })
        );
    }

    #[test]
    fn ordinary_messages_are_not_commands() {
        assert_eq!(Command::parse("hello sc"), None);
        assert_eq!(Command::parse("scary movie"), None);
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("/"), None);
    }

    #[test]
    fn history_count_defaults_and_caps() {
        assert_eq!(
            Command::parse("/sc history"),
            Some(Command::History { count: 10 })
        );
        assert_eq!(
            Command::parse("/sc history 5"),
            Some(Command::History { count: 5 })
        );
        assert_eq!(
            Command::parse("/sc history 500"),
            Some(Command::History { count: 20 })
        );
        assert_eq!(
            Command::parse("/sc history 0"),
            Some(Command::History { count: 1 })
        );
        assert_eq!(
            Command::parse("/sc history lots"),
            Some(Command::History { count: 10 })
        );
    }

    fn event(kind: ChatKind, chat_id: &str) -> InboundEvent {
        InboundEvent {
            platform: "qq".into(),
            kind,
            chat_id: chat_id.into(),
            self_id: "1".into(),
            sender_id: "42".into(),
            sender_name: Some("alice".into()),
            content: vec![Segment::text("/sc history")],
            timestamp: 0,
        }
    }

    #[tokio::test]
    async fn history_report_lists_recent_messages() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        let ev = event(ChatKind::Group, "100");
        for i in 0..3 {
            let msg = StoredMessage::new("42", Some("alice".into()), i, vec![Segment::text(format!("m{i}"))]);
            assert!(store.append(&ev.key(), msg).await);
        }

        let report = history_report(&store, &TranscriptFormatter::default(), &ev, 2).await;
        assert!(report.starts_with("Last 2 messages of the group chat (100):"));
        assert!(!report.contains("Content: m0"));
        assert!(report.contains("Content: m1"));
        assert!(report.contains("Content: m2"));
    }

    #[tokio::test]
    async fn history_report_uses_singular_for_one_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        let ev = event(ChatKind::Group, "100");
        let msg = StoredMessage::new("42", Some("alice".into()), 0, vec![Segment::text("only")]);
        assert!(store.append(&ev.key(), msg).await);

        let report = history_report(&store, &TranscriptFormatter::default(), &ev, 10).await;
        assert!(report.starts_with("Last message of the group chat (100):"));
        assert!(report.contains("Content: only"));
    }

    #[tokio::test]
    async fn history_report_on_empty_chat() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        let report = history_report(
            &store,
            &TranscriptFormatter::default(),
            &event(ChatKind::Private, "42"),
            10,
        )
        .await;
        assert_eq!(report, "No chat history yet.");
    }

    #[tokio::test]
    async fn reset_targets_other_group_on_same_platform() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        let tracker = CallStateTracker::new();
        let other = ConversationKey::group("qq", "777");
        store
            .append(&other, StoredMessage::new("9", None, 0, vec![Segment::text("x")]))
            .await;

        let ev = event(ChatKind::Private, "42");
        let report = reset_report(&store, &tracker, &ev, Some("777")).await;
        assert_eq!(report, "History of the group chat (777) has been reset.");
        assert!(store.read(&other).await.is_empty());

        let again = reset_report(&store, &tracker, &ev, Some("777")).await;
        assert_eq!(again, "The group chat (777) has no history, nothing to reset.");
    }
}
