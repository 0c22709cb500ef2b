// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Spectre.

use thiserror::Error;

/// The primary error type used across Spectre crates and collaborator traits.
#[derive(Debug, Error)]
pub enum SpectreError {
    /// Configuration errors (invalid TOML, out-of-range values, missing sections).
    #[error("configuration error: {0}")]
    Config(String),

    /// History or image storage failures (directory creation, file I/O).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A history log could not be encoded or decoded.
    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// Model invocation failures (API failure, malformed response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Image captioning failures.
    #[error("captioner error: {message}")]
    Captioner {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Chat directory lookups (group names, bot nickname) failed.
    #[error("directory lookup failed: {message}")]
    Directory {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for SpectreError {
    fn from(err: std::io::Error) -> Self {
        SpectreError::Storage {
            source: Box::new(err),
        }
    }
}
