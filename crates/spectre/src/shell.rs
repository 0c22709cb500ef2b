// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `spectre shell` command implementation.
//!
//! An interactive REPL that plays a private chat on the `shell` platform.
//! Every line goes through the same pipeline a chat platform would drive,
//! so commands such as `/sc history` work here too. Images can be attached
//! inline with `@image(/path/to/file.jpg)`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use spectre_agent::shutdown::install_signal_handler;
use spectre_agent::{Collaborators, Outcome, ReplyPipeline, spawn_image_sweeper};
use spectre_config::SpectreConfig;
use spectre_core::{
    ChatKind, ConversationKey, ImageCaptioner, InboundEvent, NullDirectory, ReplySink, Segment,
    SpectreError, StaticPersonas,
};
use spectre_openai::{OpenAiCaptioner, OpenAiProvider};
use spectre_storage::retention_window;
use tracing::{info, warn};

pub const PLATFORM: &str = "shell";
const SELF_ID: &str = "spectre";
const IMAGE_OPEN: &str = "@image(";

/// Prints replies to the terminal.
struct TerminalSink;

#[async_trait]
impl ReplySink for TerminalSink {
    async fn send(&self, _key: &ConversationKey, text: &str) -> Result<(), SpectreError> {
        println!("{} {text}", "spectre>".cyan().bold());
        Ok(())
    }
}

/// Split a line into text and `@image(path)` segments.
pub fn parse_line(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find(IMAGE_OPEN) {
        let after = &rest[start + IMAGE_OPEN.len()..];
        let Some(end) = after.find(')') else {
            break;
        };
        push_text(&mut segments, &rest[..start]);
        let path = after[..end].trim();
        if !path.is_empty() {
            segments.push(Segment::image(path));
        }
        rest = &after[end + 1..];
    }
    push_text(&mut segments, rest);
    segments
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        segments.push(Segment::text(text));
    }
}

fn event_for(user: &str, content: Vec<Segment>) -> InboundEvent {
    InboundEvent {
        platform: PLATFORM.to_string(),
        kind: ChatKind::Private,
        chat_id: user.to_string(),
        self_id: SELF_ID.to_string(),
        sender_id: user.to_string(),
        sender_name: Some(user.to_string()),
        content,
        timestamp: chrono::Utc::now().timestamp(),
    }
}

fn build_pipeline(config: SpectreConfig) -> Result<ReplyPipeline, SpectreError> {
    let provider = Arc::new(OpenAiProvider::from_config(&config.provider)?);
    let captioner: Option<Arc<dyn ImageCaptioner>> = if config.captioner.enabled {
        Some(Arc::new(OpenAiCaptioner::from_config(
            &config.captioner,
            &config.provider,
        )?))
    } else {
        None
    };
    let personas = Arc::new(StaticPersonas::new(config.personas()));

    Ok(ReplyPipeline::new(
        Arc::new(config),
        Collaborators {
            provider,
            captioner,
            personas,
            directory: Arc::new(NullDirectory),
        },
    ))
}

/// Runs the `spectre shell` REPL until `/quit`, EOF or a signal.
pub async fn run_shell(mut config: SpectreConfig, user: String) -> Result<(), SpectreError> {
    // The operator's own conversation is always recorded.
    config.enabled_private = true;
    let retention = retention_window(&config.image_processing);
    let period = Duration::from_secs(config.image_processing.sweep_interval_secs.max(1));

    let pipeline = build_pipeline(config)?;
    let cancel = install_signal_handler();
    let sweeper = pipeline
        .store()
        .vault()
        .cloned()
        .map(|vault| spawn_image_sweeper(vault, retention, period, cancel.clone()));

    let mut rl = DefaultEditor::new()
        .map_err(|e| SpectreError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "spectre shell".bold().green());
    println!(
        "Type {} for commands, {} to exit.\n",
        "/sc help".yellow(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", user.green());
    let sink = TerminalSink;
    loop {
        if cancel.is_cancelled() {
            break;
        }
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                let event = event_for(&user, parse_line(trimmed));
                match pipeline.dispatch(&event, &sink).await {
                    Outcome::Replied(_) | Outcome::Command(_) => {}
                    Outcome::Suppressed => println!("{}", "(the bot chose to stay silent)".dimmed()),
                    Outcome::Skipped(reason) => {
                        println!("{}", format!("(no reply: {reason})").dimmed())
                    }
                    Outcome::Failed(e) => eprintln!("{}: {e}", "error".red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    cancel.cancel();
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            warn!(error = %e, "image sweeper ended abnormally");
        }
    }
    info!("shell closed");
    Ok(())
}
