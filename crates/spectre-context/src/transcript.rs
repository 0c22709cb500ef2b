// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Renders stored history into a transcript a model can read.
//!
//! Each entry looks like:
//!
//! ```text
//! Sender: Ann (ID: 42)
//! Time: 2026-03-01 12:00:00
//! Content: look at this[Image: a cat on a keyboard]
//! ```
//!
//! Entries are joined by [`DIVIDER`]. Images are captioned through the
//! optional [`ImageCaptioner`]; every other non-text segment uses its
//! [`Segment::outline`] placeholder.

use std::sync::Arc;

use chrono::{Local, TimeZone};
use futures::future::{BoxFuture, FutureExt};
use spectre_core::types::reply_placeholder;
use spectre_core::{IMAGE_PLACEHOLDER, ImageCaptioner, Segment, StoredMessage};
use tracing::warn;

/// Separator between transcript entries.
pub const DIVIDER: &str = "\n-\n";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local wall-clock rendering of a Unix timestamp.
pub fn format_timestamp(timestamp: i64) -> String {
    Local
        .timestamp_opt(timestamp, 0)
        .single()
        .map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "unknown time".to_string())
}

#[derive(Clone, Default)]
pub struct TranscriptFormatter {
    captioner: Option<Arc<dyn ImageCaptioner>>,
}

impl TranscriptFormatter {
    pub fn new(captioner: Option<Arc<dyn ImageCaptioner>>) -> Self {
        Self { captioner }
    }

    /// Render the most recent `max_count` messages, oldest first.
    pub async fn render(&self, messages: &[StoredMessage], max_count: usize) -> String {
        let start = messages.len().saturating_sub(max_count);
        let mut entries = Vec::with_capacity(messages.len() - start);
        for msg in &messages[start..] {
            entries.push(format!(
                "Sender: {} (ID: {})\nTime: {}\nContent: {}",
                msg.sender_name,
                msg.sender_id,
                format_timestamp(msg.timestamp),
                self.summarize(&msg.content).await,
            ));
        }
        entries.join(DIVIDER)
    }

    /// Summarize content segments. Text passes through verbatim.
    pub fn summarize<'a>(&'a self, segments: &'a [Segment]) -> BoxFuture<'a, String> {
        async move {
            let mut out = String::new();
            for segment in segments {
                match segment {
                    Segment::Image { file, url } => {
                        let source = match url {
                            Some(url) if file.is_empty() => url.as_str(),
                            _ => file.as_str(),
                        };
                        out.push_str(&self.caption(source).await);
                    }
                    Segment::Reply {
                        sender_id,
                        sender_nickname,
                        chain,
                        message_str,
                        sender_str,
                    } => {
                        let quoted = if chain.is_empty() {
                            None
                        } else {
                            Some(self.summarize(chain).await)
                        };
                        out.push_str(&reply_placeholder(
                            sender_id,
                            sender_nickname.as_deref(),
                            quoted.as_deref(),
                            message_str.as_deref(),
                            sender_str.as_deref(),
                        ));
                    }
                    other => out.push_str(&other.outline()),
                }
            }
            out
        }
        .boxed()
    }

    async fn caption(&self, image: &str) -> String {
        let Some(captioner) = &self.captioner else {
            return IMAGE_PLACEHOLDER.to_string();
        };
        match captioner.caption(image).await {
            Ok(Some(caption)) if !caption.trim().is_empty() => {
                format!("[Image: {}]", caption.trim())
            }
            Ok(_) => IMAGE_PLACEHOLDER.to_string(),
            Err(e) => {
                warn!(image, error = %e, "image caption failed");
                IMAGE_PLACEHOLDER.to_string()
            }
        }
    }
}
