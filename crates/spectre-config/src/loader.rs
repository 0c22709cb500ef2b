// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./spectre.toml` > `~/.config/spectre/spectre.toml` > `/etc/spectre/spectre.toml`
//! with environment variable overrides via `SPECTRE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SpectreConfig;

/// Config file name looked up in each hierarchy directory.
pub const CONFIG_FILE_NAME: &str = "spectre.toml";

/// Sections reachable from environment variables, longest prefix first so
/// `model_frequency_probability_*` is not swallowed by `model_frequency_*`.
const ENV_SECTIONS: &[&str] = &[
    "model_frequency_probability",
    "model_frequency",
    "image_processing",
    "storage",
    "bot",
    "provider",
    "captioner",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/spectre/spectre.toml` (system-wide)
/// 3. `~/.config/spectre/spectre.toml` (user XDG config)
/// 4. `./spectre.toml` (local directory)
/// 5. `SPECTRE_*` environment variables
pub fn load_config() -> Result<SpectreConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SpectreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SpectreConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SpectreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SpectreConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SpectreConfig::default()))
        .merge(Toml::file(Path::new("/etc/spectre").join(CONFIG_FILE_NAME)))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("spectre").join(CONFIG_FILE_NAME))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Keys contain underscores (`enabled_private`, `api_key`), so `Env::split("_")`
/// would be ambiguous. `SPECTRE_PROVIDER_API_KEY` maps to `provider.api_key`
/// and `SPECTRE_READ_AIR` stays the top-level `read_air`.
fn env_provider() -> Env {
    Env::prefixed("SPECTRE_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
            .filter(|r| !r.is_empty())
        {
            return format!("{}.{rest}", section_path(section));
        }
    }
    key.to_string()
}

fn section_path(section: &str) -> &'static str {
    match section {
        "model_frequency_probability" => "model_frequency.probability",
        "model_frequency" => "model_frequency",
        "image_processing" => "image_processing",
        "storage" => "storage",
        "bot" => "bot",
        "provider" => "provider",
        _ => "captioner",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("provider_api_key"), "provider.api_key");
        assert_eq!(
            map_env_key("model_frequency_probability_probability"),
            "model_frequency.probability.probability"
        );
        assert_eq!(map_env_key("model_frequency_keywords"), "model_frequency.keywords");
        assert_eq!(
            map_env_key("image_processing_image_count"),
            "image_processing.image_count"
        );
        assert_eq!(map_env_key("read_air"), "read_air");
        assert_eq!(map_env_key("enabled_private"), "enabled_private");
    }
}
