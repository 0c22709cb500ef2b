// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scene-setting preamble: who the bot is and where it is chatting.

use spectre_core::{ChatDirectory, ChatKind, InboundEvent};
use tracing::warn;

pub async fn scene_preamble(event: &InboundEvent, directory: &dyn ChatDirectory) -> String {
    let bot_name = match directory.self_name(&event.platform).await {
        Ok(name) => name.filter(|n| !n.trim().is_empty()),
        Err(e) => {
            warn!(platform = %event.platform, error = %e, "bot nickname lookup failed");
            None
        }
    };

    let mut text = format!(
        "You are browsing a chat app. Your id on this app is {}",
        event.self_id
    );
    if let Some(name) = bot_name {
        text.push_str(&format!(" and your username is {name}"));
    }

    match event.kind {
        ChatKind::Private => {
            let counterpart = match event.sender_name.as_deref().filter(|n| !n.trim().is_empty()) {
                Some(name) => name.to_string(),
                None => format!("the person with ID {}", event.sender_id),
            };
            text.push_str(&format!(
                ". You are in a private chat with {counterpart}."
            ));
        }
        ChatKind::Group => {
            let group = group_display_name(event, directory).await;
            text.push_str(&format!(". You are in the group chat {group}."));
        }
    }
    text
}

/// `name(id)` when the directory knows the group, else the bare id.
async fn group_display_name(event: &InboundEvent, directory: &dyn ChatDirectory) -> String {
    match directory.group_name(&event.platform, &event.chat_id).await {
        Ok(Some(name)) if !name.trim().is_empty() => format!("{name}({})", event.chat_id),
        Ok(_) => event.chat_id.clone(),
        Err(e) => {
            warn!(
                platform = %event.platform,
                group = %event.chat_id,
                error = %e,
                "group info lookup failed"
            );
            event.chat_id.clone()
        }
    }
}
