// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning stored image references into `image_url` values.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;

/// Resolve `reference` to something the API accepts.
///
/// Remote and data URLs pass through. Local files (`file://` or a bare
/// path) are inlined as base64 data URLs; unreadable files yield `None`.
pub async fn image_url_for(reference: &str) -> Option<String> {
    if reference.starts_with("http://")
        || reference.starts_with("https://")
        || reference.starts_with("data:")
    {
        return Some(reference.to_string());
    }

    let path = Path::new(reference.strip_prefix("file://").unwrap_or(reference));
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(format!(
            "data:{};base64,{}",
            mime_for(path),
            STANDARD.encode(bytes)
        )),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read image, not attaching it");
            None
        }
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}
