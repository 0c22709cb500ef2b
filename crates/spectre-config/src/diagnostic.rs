// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Converts Figment deserialization errors into miette diagnostics with
//! source spans, valid key listings, and "did you mean?" suggestions using
//! Jaro-Winkler string similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(spectre::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Suggested correction via fuzzy matching, if any.
        suggestion: Option<String>,
        /// Comma-separated valid keys for the section.
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(spectre::config::invalid_type), help("{hint}"))]
    InvalidType {
        key: String,
        detail: String,
        /// What the key accepts, phrased for the Spectre setting it belongs to.
        hint: String,
        #[label("wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A string value is not one of the accepted choices.
    #[error("unknown value `{value}` for key `{key}`")]
    #[diagnostic(
        code(spectre::config::unknown_value),
        help("{}", format_unknown_value_help(suggestion.as_deref(), choices))
    )]
    UnknownValue {
        key: String,
        value: String,
        suggestion: Option<String>,
        /// Comma-separated accepted values.
        choices: String,
        #[label("not an accepted value")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A required key is missing (only `[[personas]].name` today).
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(spectre::config::missing_key),
        help("add `{key} = <value>` to your spectre.toml")
    )]
    MissingKey { key: String },

    /// A value deserialized but violates a semantic constraint.
    #[error("validation error: {message}")]
    #[diagnostic(code(spectre::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(spectre::config::other))]
    Other(String),
}

fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

fn format_unknown_value_help(suggestion: Option<&str>, choices: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Accepted values: {choices}"),
        None => format!("accepted values: {choices}"),
    }
}

/// What a key accepts. Settings whose meaning is narrower than their Rust
/// type get a concrete example; everything else falls back to `expected`.
pub fn type_hint(key: &str, expected: &str) -> String {
    let hint = match key {
        "model_frequency.probability.probability" => {
            "a number between 0.0 and 1.0, e.g. `probability = 0.1`"
        }
        "model_frequency.keywords" | "model_frequency.blacklist_keywords" => {
            "a list of strings, e.g. `keywords = [\"spectre\"]`"
        }
        "enabled_groups" => "a list of group ids as strings, e.g. `enabled_groups = [\"123456\"]`",
        "image_processing.image_retention_days" => "a whole number of days between 1 and 365",
        "image_processing.image_count" => {
            "a whole number of images to attach, 0 disables attachment"
        }
        "image_processing.enable_image_persistence" => "`true` or `false`",
        "group_msg_history" => "a whole number of messages to keep in the prompt",
        _ => return format!("expected {expected}"),
    };
    format!("expected {hint}")
}

/// Convert a `figment::Error` (which may hold several errors) into diagnostics.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid_keys: Vec<&str> = expected.to_vec();
                let (span, src) = find_source_span(&error, &error.path, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, &valid_keys),
                    valid_keys: valid_keys.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => {
                let key = error.path.join(".");
                let (span, src) = leaf_span(&error, toml_sources);
                ConfigError::InvalidType {
                    hint: type_hint(&key, expected),
                    detail: format!("found {actual}, expected {expected}"),
                    key,
                    span,
                    src,
                }
            }
            Kind::UnknownVariant(value, choices) => {
                let (span, src) = leaf_span(&error, toml_sources);
                ConfigError::UnknownValue {
                    key: error.path.join("."),
                    value: value.clone(),
                    suggestion: suggest_key(value, choices),
                    choices: choices.join(", "),
                    span,
                    src,
                }
            }
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Span of the value-bearing key itself, whose name is the last path segment.
fn leaf_span(
    error: &figment::error::Error,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    match error.path.split_last() {
        Some((field, table)) => find_source_span(error, table, field, toml_sources),
        None => (None, None),
    }
}

fn find_source_span(
    error: &figment::error::Error,
    table: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline strings carry no file path; fall back to the only source given.
    let source = match source_path {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    if let Some((path, content)) = source
        && let Some(offset) = find_key_offset(content, table, field)
    {
        let span = SourceSpan::new(offset.into(), field.len());
        return (Some(span), Some(NamedSource::new(path, content.clone())));
    }

    (None, None)
}

/// Byte offset of `field` inside the table named by `path`.
///
/// `path = ["model_frequency", "probability"]` looks for the
/// `[model_frequency.probability]` header first. Top-level fields search from
/// the start of the file.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let search_start = if path.is_empty() {
        0
    } else {
        let header = format!("[{}]", path.join("."));
        content.find(&header).map(|pos| pos + header.len())?
    };

    let remaining = &content[search_start..];
    let mut byte_offset = 0;
    for line in remaining.lines() {
        let trimmed = line.trim_start();
        if let Some(after) = trimmed.strip_prefix(field)
            && (after.starts_with(' ') || after.starts_with('=') || after.starts_with('\t'))
        {
            let field_start_in_line = line.len() - trimmed.len();
            return Some(search_start + byte_offset + field_start_in_line);
        }
        byte_offset += line.len() + 1;
    }

    None
}

/// Best Jaro-Winkler match above the threshold, if any.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|&key| (key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_string())
}

/// Render diagnostics to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}
