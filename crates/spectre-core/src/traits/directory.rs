// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform lookups used while describing the scene to the model.

use async_trait::async_trait;

use crate::error::SpectreError;

/// Optional platform queries. Both default to "unknown".
#[async_trait]
pub trait ChatDirectory: Send + Sync {
    /// Human-readable name of a group chat.
    async fn group_name(
        &self,
        _platform: &str,
        _group_id: &str,
    ) -> Result<Option<String>, SpectreError> {
        Ok(None)
    }

    /// The bot's own nickname on a platform.
    async fn self_name(&self, _platform: &str) -> Result<Option<String>, SpectreError> {
        Ok(None)
    }
}

/// A directory that knows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDirectory;

#[async_trait]
impl ChatDirectory for NullDirectory {}
