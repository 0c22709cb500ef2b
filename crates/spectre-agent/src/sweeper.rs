// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic removal of expired persisted images.

use std::time::Duration;

use spectre_storage::ImageVault;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Spawn a task that sweeps `vault` every `period`, deleting images older
/// than `retention`. The first sweep runs immediately. The task ends when
/// `cancel` fires.
pub fn spawn_image_sweeper(
    vault: ImageVault,
    retention: Duration,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            dir = %vault.dir().display(),
            retention_secs = retention.as_secs(),
            period_secs = period.as_secs(),
            "image sweeper started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("image sweeper stopped");
                    break;
                }
                _ = interval.tick() => {
                    match vault.sweep(retention).await {
                        Ok(0) => {}
                        Ok(removed) => debug!(removed, "sweep pass complete"),
                        Err(e) => error!(error = %e, "image sweep failed"),
                    }
                }
            }
        }
    })
}
