// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stand-ins for the host chat platform.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use spectre_core::{ChatDirectory, ConversationKey, ReplySink, SpectreError};
use tokio::sync::Mutex;

/// Captures every message the pipeline sends.
#[derive(Default)]
pub struct MockSink {
    sent: Arc<Mutex<Vec<(ConversationKey, String)>>>,
    fail: AtomicBool,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<(ConversationKey, String)> {
        self.sent.lock().await.clone()
    }

    /// Texts sent, in order, ignoring the destination.
    pub async fn texts(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|(_, t)| t.clone()).collect()
    }
}

#[async_trait]
impl ReplySink for MockSink {
    async fn send(&self, key: &ConversationKey, text: &str) -> Result<(), SpectreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SpectreError::Internal("mock sink refused delivery".into()));
        }
        self.sent.lock().await.push((key.clone(), text.to_string()));
        Ok(())
    }
}

/// A directory answering from fixed tables.
#[derive(Default)]
pub struct MockDirectory {
    groups: HashMap<String, String>,
    self_name: Option<String>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.groups.insert(group_id.into(), name.into());
        self
    }

    pub fn with_self_name(mut self, name: impl Into<String>) -> Self {
        self.self_name = Some(name.into());
        self
    }
}

#[async_trait]
impl ChatDirectory for MockDirectory {
    async fn group_name(
        &self,
        _platform: &str,
        group_id: &str,
    ) -> Result<Option<String>, SpectreError> {
        Ok(self.groups.get(group_id).cloned())
    }

    async fn self_name(&self, _platform: &str) -> Result<Option<String>, SpectreError> {
        Ok(self.self_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sink_records_and_can_fail() {
        let sink = MockSink::new();
        let key = ConversationKey::private("shell", "me");
        sink.send(&key, "hi").await.unwrap();
        sink.set_failing(true);
        assert!(sink.send(&key, "lost").await.is_err());
        assert_eq!(sink.texts().await, vec!["hi".to_string()]);
    }
}
