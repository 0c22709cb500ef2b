// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `spectre history`, `reset`, `sweep` and `config check`.

use colored::Colorize;
use spectre_config::SpectreConfig;
use spectre_context::TranscriptFormatter;
use spectre_core::{ConversationKey, SpectreError};
use spectre_storage::{HistoryStore, ImageVault, retention_window};
use tracing::info;

pub async fn print_history(
    config: &SpectreConfig,
    key: &ConversationKey,
    count: usize,
) -> Result<(), SpectreError> {
    let store = HistoryStore::new(config.storage.history_path());
    let history = store.try_read(key).await?;
    if history.is_empty() {
        println!("{}", format!("no history for {key}").dimmed());
        return Ok(());
    }

    let shown = history.len().min(count.max(1));
    let body = TranscriptFormatter::default().render(&history, shown).await;
    println!("{}", format!("last {shown} of {} messages in {key}", history.len()).bold());
    println!("{body}");
    Ok(())
}

pub async fn reset(config: &SpectreConfig, key: &ConversationKey) -> Result<(), SpectreError> {
    let store = HistoryStore::new(config.storage.history_path());
    if store.read(key).await.is_empty() {
        println!("{key} has no history, nothing to reset");
        return Ok(());
    }
    if !store.clear(key).await {
        return Err(SpectreError::Internal(format!("failed to reset {key}")));
    }
    println!("{} history of {key}", "reset".green());
    Ok(())
}

pub async fn sweep(config: &SpectreConfig) -> Result<(), SpectreError> {
    let vault = ImageVault::new(config.storage.images_path());
    let retention = retention_window(&config.image_processing);
    let removed = vault.sweep(retention).await?;
    info!(removed, "manual sweep finished");
    println!(
        "removed {removed} image(s) older than {} day(s) from {}",
        config.image_processing.retention_days(),
        vault.dir().display()
    );
    Ok(())
}

pub fn print_config_summary(config: &SpectreConfig) {
    println!("{}", "configuration OK".green());
    let rows = [
        ("history_dir", config.storage.history_path().display().to_string()),
        ("images_dir", config.storage.images_path().display().to_string()),
        ("enabled_private", config.enabled_private.to_string()),
        ("enabled_groups", config.enabled_groups.join(", ")),
        ("reply method", config.model_frequency.method.to_string()),
        (
            "probability",
            config.model_frequency.probability.probability.to_string(),
        ),
        ("read_air", config.read_air.to_string()),
        ("persona", config.persona.clone()),
        ("provider", format!("{} ({})", config.provider.base_url, config.provider.model)),
        ("captioner", config.captioner.enabled.to_string()),
    ];
    for (name, value) in rows {
        println!("  {:<16} {}", name.dimmed(), value);
    }
}
