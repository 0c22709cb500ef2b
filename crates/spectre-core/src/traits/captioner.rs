// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image captioning collaborator.

use async_trait::async_trait;

use crate::error::SpectreError;

/// Produces a short natural-language description of an image.
#[async_trait]
pub trait ImageCaptioner: Send + Sync {
    /// `image` is a local path, `file://` URL or remote URL. `Ok(None)` means
    /// the captioner had nothing to say; callers fall back to a placeholder
    /// on both `None` and `Err`.
    async fn caption(&self, image: &str) -> Result<Option<String>, SpectreError>;
}
