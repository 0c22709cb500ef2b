// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation history logs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use spectre_config::SpectreConfig;
use spectre_core::{ConversationKey, SpectreError, StoredMessage};
use tracing::{debug, error, warn};

use crate::images::ImageVault;

/// Most recent entries kept per conversation.
pub const MAX_HISTORY_ENTRIES: usize = 200;

/// Drop the oldest entries until at most `cap` remain.
pub fn enforce_limit<T>(log: &mut Vec<T>, cap: usize) {
    if log.len() > cap {
        let excess = log.len() - cap;
        log.drain(..excess);
    }
}

/// Append-only chat history, one JSON file per conversation.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    root: PathBuf,
    vault: Option<ImageVault>,
}

impl HistoryStore {
    /// A store rooted at `root` that leaves image references untouched.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            vault: None,
        }
    }

    /// Rewrite image references into `vault` before every write.
    pub fn with_vault(mut self, vault: ImageVault) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn from_config(config: &SpectreConfig) -> Self {
        let store = Self::new(config.storage.history_path());
        if config.image_processing.enable_image_persistence {
            store.with_vault(ImageVault::new(config.storage.images_path()))
        } else {
            store
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vault(&self) -> Option<&ImageVault> {
        self.vault.as_ref()
    }

    /// Location of a conversation's log.
    pub fn path_for(&self, key: &ConversationKey) -> PathBuf {
        self.root
            .join(sanitize_component(&key.platform))
            .join(key.kind.to_string())
            .join(format!("{}.json", sanitize_component(&key.chat_id)))
    }

    /// Append one message, persisting its images and truncating the log.
    ///
    /// Returns `false` on any I/O or serialization failure; the failure is logged.
    pub async fn append(&self, key: &ConversationKey, message: StoredMessage) -> bool {
        match self.try_append(key, message).await {
            Ok(len) => {
                debug!(conversation = %key, entries = len, "history appended");
                true
            }
            Err(e) => {
                error!(conversation = %key, error = %e, "failed to append history");
                false
            }
        }
    }

    /// Fallible append. Returns the log length after truncation.
    pub async fn try_append(
        &self,
        key: &ConversationKey,
        mut message: StoredMessage,
    ) -> Result<usize, SpectreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if let Some(vault) = &self.vault {
            vault.persist_segments(&mut message.content).await;
        }

        let mut log = match load_log(&path).await {
            Ok(log) => log,
            Err(SpectreError::Serialization { source }) => {
                warn!(
                    conversation = %key,
                    error = %source,
                    "history log is unreadable, starting a new one"
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        log.push(message);
        enforce_limit(&mut log, MAX_HISTORY_ENTRIES);

        let json = serde_json::to_vec_pretty(&log)?;
        tokio::fs::write(&path, json).await?;
        Ok(log.len())
    }

    /// The conversation's log, oldest first. Empty if absent or unreadable.
    pub async fn read(&self, key: &ConversationKey) -> Vec<StoredMessage> {
        match self.try_read(key).await {
            Ok(log) => log,
            Err(e) => {
                error!(conversation = %key, error = %e, "failed to read history");
                Vec::new()
            }
        }
    }

    /// Fallible read. A missing log is an empty history, not an error.
    pub async fn try_read(&self, key: &ConversationKey) -> Result<Vec<StoredMessage>, SpectreError> {
        load_log(&self.path_for(key)).await
    }

    /// Delete the conversation's log. Absence counts as success.
    pub async fn clear(&self, key: &ConversationKey) -> bool {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => {
                debug!(conversation = %key, "history cleared");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                error!(conversation = %key, error = %e, "failed to clear history");
                false
            }
        }
    }
}

async fn load_log(path: &Path) -> Result<Vec<StoredMessage>, SpectreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Keep platform names and chat ids from escaping the history tree.
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => format!("_{cleaned}"),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use spectre_core::{ChatKind, Segment};

    fn msg(i: usize) -> StoredMessage {
        StoredMessage::new(
            format!("u{i}"),
            Some(format!("user {i}")),
            i as i64,
            vec![Segment::text(format!("message {i}"))],
        )
    }

    #[test]
    fn path_layout_is_platform_kind_id() {
        let store = HistoryStore::new("/data");
        let key = ConversationKey::group("qq", "12345");
        assert_eq!(
            store.path_for(&key),
            PathBuf::from("/data/qq/group/12345.json")
        );
        let key = ConversationKey::new("tg", ChatKind::Private, "7");
        assert_eq!(store.path_for(&key), PathBuf::from("/data/tg/private/7.json"));
    }

    #[test]
    fn path_components_cannot_escape_root() {
        let store = HistoryStore::new("/data");
        let key = ConversationKey::group("..", "../../etc/passwd");
        let path = store.path_for(&key);
        assert!(path.starts_with("/data"));
        assert!(!path.components().any(|c| c.as_os_str() == ".."));
    }

    #[tokio::test]
    async fn append_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        let key = ConversationKey::group("qq", "1");
        let original = StoredMessage::new(
            "42",
            Some("Ann".into()),
            1_700_000_000,
            vec![
                Segment::text("look"),
                Segment::Face { id: "14".into() },
                Segment::Reply {
                    sender_id: "7".into(),
                    sender_nickname: Some("Bo".into()),
                    chain: vec![Segment::text("earlier")],
                    message_str: None,
                    sender_str: None,
                },
            ],
        );

        assert!(store.append(&key, original.clone()).await);
        let log = store.read(&key).await;
        assert_eq!(log, vec![original.clone()]);
        assert_eq!(log[0].outline(), original.outline());
    }

    #[tokio::test]
    async fn log_is_capped_at_two_hundred() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        let key = ConversationKey::private("qq", "9");
        for i in 0..205 {
            assert!(store.append(&key, msg(i)).await);
        }
        let log = store.read(&key).await;
        assert_eq!(log.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(log.first().unwrap().sender_id, "u5");
        assert_eq!(log.last().unwrap().sender_id, "u204");
    }

    #[tokio::test]
    async fn clear_then_read_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        let key = ConversationKey::group("qq", "1");
        assert!(store.append(&key, msg(0)).await);
        assert!(store.clear(&key).await);
        assert!(store.read(&key).await.is_empty());

        let never = ConversationKey::group("qq", "never");
        assert!(store.clear(&never).await);
        assert!(store.read(&never).await.is_empty());
    }

    #[tokio::test]
    async fn conversations_are_isolated_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        let group = ConversationKey::group("qq", "5");
        let private = ConversationKey::private("qq", "5");
        assert!(store.append(&group, msg(1)).await);
        assert!(store.read(&private).await.is_empty());
        assert_eq!(store.read(&group).await.len(), 1);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn corrupt_log_reads_empty_and_is_replaced_on_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        let key = ConversationKey::group("qq", "1");
        let path = store.path_for(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"[{ not json").unwrap();

        assert!(store.try_read(&key).await.is_err());
        assert!(store.read(&key).await.is_empty());
        assert!(logs_contain("failed to read history"));

        assert!(store.append(&key, msg(1)).await);
        assert_eq!(store.read(&key).await.len(), 1);
        assert!(logs_contain("history log is unreadable"));
    }

    #[tokio::test]
    async fn append_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("root");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let store = HistoryStore::new(&blocker);
        assert!(!store.append(&ConversationKey::group("qq", "1"), msg(0)).await);
    }

    proptest! {
        #[test]
        fn enforce_limit_keeps_newest(n in 0usize..600, cap in 1usize..250) {
            let mut log: Vec<usize> = (0..n).collect();
            enforce_limit(&mut log, cap);
            prop_assert_eq!(log.len(), n.min(cap));
            if let Some(last) = log.last() {
                prop_assert_eq!(*last, n - 1);
            }
            prop_assert!(log.windows(2).all(|w| w[0] + 1 == w[1]));
        }
    }
}
