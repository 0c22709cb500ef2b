// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model invocation collaborator.

use async_trait::async_trait;

use crate::error::SpectreError;
use crate::types::ModelRequest;

/// Sends a built request to a language model and returns its raw reply text.
///
/// Cancellation and timeouts are the implementor's responsibility; callers
/// simply await the result.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn invoke(&self, request: ModelRequest) -> Result<String, SpectreError>;
}
