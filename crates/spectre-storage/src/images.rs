// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent image copies and age-based sweeping.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use spectre_config::model::ImageProcessingConfig;
use spectre_core::{Segment, SpectreError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Extensions kept when copying; anything else is stored as `.jpg`.
const KNOWN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
const DEFAULT_EXTENSION: &str = "jpg";
const FILE_URL_PREFIX: &str = "file://";

/// Retention window derived from configuration, clamped to 1..=365 days.
pub fn retention_window(config: &ImageProcessingConfig) -> Duration {
    Duration::from_secs(config.retention_days() * 24 * 60 * 60)
}

/// A directory of UUID-named image copies.
#[derive(Debug, Clone)]
pub struct ImageVault {
    dir: PathBuf,
}

impl ImageVault {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy every local image into the vault and point the segment at the copy.
    ///
    /// Remote URLs and references already inside the vault are left alone.
    /// A failed copy keeps the original reference and is logged. Returns the
    /// number of images persisted.
    pub async fn persist_segments(&self, segments: &mut [Segment]) -> usize {
        let mut persisted = 0;
        for segment in segments.iter_mut() {
            let Segment::Image { file, .. } = segment else {
                continue;
            };
            match self.persist(file).await {
                Ok(Some(stored)) => {
                    debug!(from = %file, to = %stored, "image persisted");
                    *file = stored;
                    persisted += 1;
                }
                Ok(None) => {}
                Err(e) => warn!(image = %file, error = %e, "failed to persist image"),
            }
        }
        persisted
    }

    /// Copy one image reference. `Ok(None)` means there was nothing to copy.
    pub async fn persist(&self, reference: &str) -> Result<Option<String>, SpectreError> {
        let Some(source) = local_path(reference) else {
            return Ok(None);
        };
        if !tokio::fs::try_exists(&source).await? {
            debug!(image = %reference, "image source does not exist locally, leaving as is");
            return Ok(None);
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let vault_dir = tokio::fs::canonicalize(&self.dir).await?;
        let source = tokio::fs::canonicalize(&source).await?;
        if source.starts_with(&vault_dir) {
            return Ok(None);
        }

        let dest = vault_dir.join(format!(
            "{}.{}",
            Uuid::new_v4().simple(),
            extension_for(&source)
        ));
        tokio::fs::copy(&source, &dest).await?;
        Ok(Some(format!("{FILE_URL_PREFIX}{}", dest.display())))
    }

    /// Delete images older than `retention`.
    pub async fn sweep(&self, retention: Duration) -> Result<usize, SpectreError> {
        self.sweep_at(SystemTime::now(), retention).await
    }

    /// Delete images whose creation time (or modification time where the
    /// filesystem does not record creation) is more than `retention` before `now`.
    pub async fn sweep_at(&self, now: SystemTime, retention: Duration) -> Result<usize, SpectreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "cannot stat image");
                    continue;
                }
            };
            let Ok(born) = metadata.created().or_else(|_| metadata.modified()) else {
                continue;
            };
            let age = now.duration_since(born).unwrap_or_default();
            if age <= retention {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "failed to delete expired image")
                }
            }
        }

        if removed > 0 {
            info!(removed, dir = %self.dir.display(), "expired images swept");
        }
        Ok(removed)
    }
}

/// Local filesystem path behind a reference, if it has one.
fn local_path(reference: &str) -> Option<PathBuf> {
    if let Some(path) = reference.strip_prefix(FILE_URL_PREFIX) {
        return Some(PathBuf::from(path));
    }
    if reference.contains("://") || reference.starts_with("base64:") || reference.is_empty() {
        return None;
    }
    Some(PathBuf::from(reference))
}

fn extension_for(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|e| KNOWN_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
