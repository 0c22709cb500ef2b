// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spectre - a chat-bot core that decides when to speak.
//!
//! This is the binary entry point: an interactive shell plus maintenance
//! commands over the on-disk history.

mod admin;
mod shell;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use spectre_config::SpectreConfig;
use spectre_core::ConversationKey;
use tracing_subscriber::EnvFilter;

/// Spectre - a chat-bot core that decides when to speak.
#[derive(Parser, Debug)]
#[command(name = "spectre", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the bot as a private conversation on the `shell` platform.
    Shell {
        /// User id to chat as.
        #[arg(long, default_value = "operator")]
        user: String,
    },
    /// Print the recent history of a conversation.
    History {
        #[command(flatten)]
        chat: ChatArgs,
        /// Number of messages to show.
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Delete the history of a conversation.
    Reset {
        #[command(flatten)]
        chat: ChatArgs,
    },
    /// Delete persisted images older than the retention window.
    Sweep,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate configuration and print a summary.
    Check,
}

#[derive(Args, Debug)]
struct ChatArgs {
    /// Platform name, e.g. `qq`.
    #[arg(long)]
    platform: String,
    #[command(flatten)]
    target: ChatTarget,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ChatTarget {
    /// Group chat id.
    #[arg(long)]
    group: Option<String>,
    /// Private chat id (the counterpart's user id).
    #[arg(long)]
    private: Option<String>,
}

impl ChatArgs {
    fn key(&self) -> ConversationKey {
        match (&self.target.group, &self.target.private) {
            (Some(id), _) => ConversationKey::group(self.platform.clone(), id.clone()),
            (None, Some(id)) => ConversationKey::private(self.platform.clone(), id.clone()),
            // clap enforces exactly one of the two.
            (None, None) => ConversationKey::private(self.platform.clone(), String::new()),
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> SpectreConfig {
    let loaded = match path {
        Some(path) => spectre_config::load_and_validate_path(path),
        None => spectre_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            spectre_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.log_level);

    let result = match cli.command {
        Some(Commands::Shell { user }) => shell::run_shell(config, user).await,
        Some(Commands::History { chat, count }) => {
            admin::print_history(&config, &chat.key(), count).await
        }
        Some(Commands::Reset { chat }) => admin::reset(&config, &chat.key()).await,
        Some(Commands::Sweep) => admin::sweep(&config).await,
        Some(Commands::Config {
            action: ConfigCommand::Check,
        }) => {
            admin::print_config_summary(&config);
            Ok(())
        }
        None => {
            println!("spectre: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
