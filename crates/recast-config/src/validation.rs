// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: the tokenizer pattern must compile, store keys must not be
//! empty or collide, and the retry limit must stay small.

use regex::Regex;

use crate::diagnostic::ConfigError;
use crate::model::{RecastConfig, StorageBackend};

/// Highest accepted `queue.retry_limit`.
pub const MAX_RETRY_LIMIT: u32 = 100;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &RecastConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.app.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "app.log_level `{}` must be one of {}",
            config.app.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.backend == StorageBackend::Sqlite
        && config.storage.database_path.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty when storage.backend = \"sqlite\"",
        ));
    }

    if let Err(e) = Regex::new(&config.parser.pattern) {
        errors.push(ConfigError::validation(format!(
            "parser.pattern is not a valid regular expression: {e}"
        )));
    }

    let keys = [
        ("exclusion.key_prefix", &config.exclusion.key_prefix),
        ("media.key_prefix", &config.media.key_prefix),
        ("queue.storage_key", &config.queue.storage_key),
    ];
    for (name, value) in keys {
        if value.trim().is_empty() {
            errors.push(ConfigError::validation(format!("{name} must not be empty")));
        }
    }

    // Managers must never share a key: neither prefix may be a prefix of the other,
    // and the queue key must not fall inside either namespace.
    let (exclusion, media, queue) = (
        &config.exclusion.key_prefix,
        &config.media.key_prefix,
        &config.queue.storage_key,
    );
    if !exclusion.is_empty()
        && !media.is_empty()
        && (exclusion.starts_with(media.as_str()) || media.starts_with(exclusion.as_str()))
    {
        errors.push(ConfigError::validation(format!(
            "exclusion.key_prefix `{exclusion}` and media.key_prefix `{media}` overlap"
        )));
    }
    for (name, prefix) in [("exclusion.key_prefix", exclusion), ("media.key_prefix", media)] {
        if !prefix.is_empty() && queue.starts_with(prefix.as_str()) {
            errors.push(ConfigError::validation(format!(
                "queue.storage_key `{queue}` falls inside {name} `{prefix}`"
            )));
        }
    }

    if config.queue.retry_limit > MAX_RETRY_LIMIT {
        errors.push(ConfigError::validation(format!(
            "queue.retry_limit must be at most {MAX_RETRY_LIMIT}, got {}",
            config.queue.retry_limit
        )));
    }

    if config.media.marker_class.trim().is_empty()
        || config.media.marker_class.contains(char::is_whitespace)
    {
        errors.push(ConfigError::validation(format!(
            "media.marker_class `{}` must be a single non-empty class name",
            config.media.marker_class
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
