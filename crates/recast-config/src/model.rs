// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Recast.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Recast configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecastConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Key-value store backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Exclusion list persistence settings.
    #[serde(default)]
    pub exclusion: ExclusionConfig,

    /// Media extraction and insertion settings.
    #[serde(default)]
    pub media: MediaConfig,

    /// Tokenizer settings.
    #[serde(default)]
    pub parser: ParserConfig,

    /// Processing pipeline settings.
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Outbound retry queue settings.
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Process-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which key-value store implementation backs the managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite file at `database_path`.
    #[default]
    Sqlite,
    /// Process memory only; nothing survives a restart.
    Memory,
}

/// Key-value store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("recast").join("recast.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("recast.db"))
        .to_string_lossy()
        .into_owned()
}

/// Exclusion list configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExclusionConfig {
    /// Store key prefix; the message ID is appended.
    #[serde(default = "default_exclusion_prefix")]
    pub key_prefix: String,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_exclusion_prefix(),
        }
    }
}

fn default_exclusion_prefix() -> String {
    "exclusion_".to_string()
}

/// Media handler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MediaConfig {
    /// Store key prefix for persisted media caches.
    #[serde(default = "default_media_prefix")]
    pub key_prefix: String,

    /// Persist extracted media descriptors so later sessions skip the fetch.
    #[serde(default = "default_true")]
    pub persist_cache: bool,

    /// Class attached to every element the handler inserts.
    #[serde(default = "default_marker_class")]
    pub marker_class: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_media_prefix(),
            persist_cache: true,
            marker_class: default_marker_class(),
        }
    }
}

fn default_media_prefix() -> String {
    "media_".to_string()
}

fn default_marker_class() -> String {
    "recast-inserted-media".to_string()
}

fn default_true() -> bool {
    true
}

/// Tokenizer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParserConfig {
    /// Regular expression whose matches become tokens.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Tokens dropped after matching (exact, post-normalization).
    #[serde(default)]
    pub exclusion_tokens: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            exclusion_tokens: Vec::new(),
        }
    }
}

fn default_pattern() -> String {
    r"\w+".to_string()
}

/// Processing pipeline configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessorConfig {
    /// A message containing any of these tokens is marked excluded.
    #[serde(default)]
    pub blocked_keywords: Vec<String>,
}

/// Retry queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Store key holding the serialized queue.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Retries allowed before a message is dropped.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            retry_limit: default_retry_limit(),
        }
    }
}

fn default_storage_key() -> String {
    "message_queue".to_string()
}

fn default_retry_limit() -> u32 {
    3
}
