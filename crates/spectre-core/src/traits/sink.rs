// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery collaborator.

use async_trait::async_trait;

use crate::error::SpectreError;
use crate::types::ConversationKey;

/// Delivers reply text to a conversation on the host platform.
///
/// A reply is recorded in history only after `send` succeeds.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, key: &ConversationKey, text: &str) -> Result<(), SpectreError>;
}
