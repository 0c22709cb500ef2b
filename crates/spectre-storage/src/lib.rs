// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed persistence for Spectre.
//!
//! Each conversation owns one pretty-printed JSON log at
//! `<history_dir>/<platform>/<private|group>/<chat_id>.json`, capped at the
//! [`MAX_HISTORY_ENTRIES`] most recent turns. Images referenced by stored
//! messages are copied into an [`ImageVault`] so the log never points at a
//! transient cache path, and the vault is swept by age.
//!
//! Writes overwrite the log in place. A crash mid-write can corrupt a log;
//! reads of a corrupt log yield an empty history and the next append starts
//! it afresh.

pub mod history;
pub mod images;

pub use history::{HistoryStore, MAX_HISTORY_ENTRIES, enforce_limit};
pub use images::{ImageVault, retention_window};

use spectre_config::SpectreConfig;
use spectre_core::ConversationKey;

/// Whether history may be written for a conversation.
pub fn is_enabled(key: &ConversationKey, config: &SpectreConfig) -> bool {
    config.is_enabled(key)
}
