// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-processing of raw model output.

use spectre_config::SpectreConfig;
use spectre_core::NO_RESPONSE;
use tracing::{debug, warn};

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Remove a reasoning block that opens at the very first byte, plus the
/// whitespace after it. Text without such a block is returned unchanged.
pub fn strip_thinking(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(THINK_OPEN) else {
        return text;
    };
    match rest.find(THINK_CLOSE) {
        Some(end) => rest[end + THINK_CLOSE.len()..].trim_start(),
        None => text,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFilter {
    pub read_air: bool,
    pub filter_thinking: bool,
}

impl From<&SpectreConfig> for ResponseFilter {
    fn from(config: &SpectreConfig) -> Self {
        Self {
            read_air: config.read_air,
            filter_thinking: config.filter_thinking,
        }
    }
}

impl ResponseFilter {
    /// Apply the filter. A result equal to [`NO_RESPONSE`] means the reply
    /// must not be sent.
    ///
    /// The sentinel is looked for after stripping, and the stripped text is
    /// preferred only when a reasoning block was actually removed.
    pub fn process(&self, raw: &str) -> String {
        if raw.is_empty() {
            warn!("model returned an empty reply");
            return String::new();
        }

        let stripped = strip_thinking(raw);
        if self.read_air && stripped.contains(NO_RESPONSE) {
            return NO_RESPONSE.to_string();
        }
        if self.filter_thinking && stripped != raw {
            debug!("reasoning block removed from reply");
            return stripped.to_string();
        }
        raw.to_string()
    }
}

/// Whether filtered output means "do not reply".
pub fn is_suppressed(filtered: &str) -> bool {
    filtered == NO_RESPONSE || filtered.trim().is_empty()
}
