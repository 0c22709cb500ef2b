// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express: probability
//! bounds, a non-empty transcript window, usable endpoints, unique personas.

use std::collections::HashSet;

use tracing::warn;

use crate::diagnostic::ConfigError;
use crate::model::SpectreConfig;

/// Validate a deserialized configuration.
///
/// Returns all collected errors rather than failing fast. Out-of-range
/// `image_retention_days` is not an error; it is clamped when used.
pub fn validate_config(config: &SpectreConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let p = config.model_frequency.probability.probability;
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        errors.push(ConfigError::Validation {
            message: format!(
                "model_frequency.probability.probability must be between 0 and 1, got {p}"
            ),
        });
    }

    if config.group_msg_history == 0 {
        errors.push(ConfigError::Validation {
            message: "group_msg_history must be at least 1".to_string(),
        });
    }

    if config.storage.history_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.history_dir must not be empty".to_string(),
        });
    }

    if config.image_processing.sweep_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "image_processing.sweep_interval_secs must be at least 1".to_string(),
        });
    }

    if !is_http_url(&config.provider.base_url) {
        errors.push(ConfigError::Validation {
            message: format!(
                "provider.base_url `{}` must start with http:// or https://",
                config.provider.base_url
            ),
        });
    }

    if let Some(url) = &config.captioner.base_url
        && !is_http_url(url)
    {
        errors.push(ConfigError::Validation {
            message: format!("captioner.base_url `{url}` must start with http:// or https://"),
        });
    }

    let mut seen_names = HashSet::new();
    for (i, persona) in config.personas.iter().enumerate() {
        if persona.name.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("personas[{i}].name must not be empty"),
            });
        } else if !seen_names.insert(persona.name.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "duplicate persona name `{}` in [[personas]] array",
                    persona.name
                ),
            });
        }
    }

    // A missing persona only disables persona injection.
    if !config.persona.is_empty() && !seen_names.contains(config.persona.as_str()) {
        warn!(
            persona = %config.persona,
            "configured persona is not defined in [[personas]]; replies will use no persona"
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
