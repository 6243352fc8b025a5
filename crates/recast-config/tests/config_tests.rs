// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Recast configuration system.

use figment::Jail;
use recast_config::diagnostic::ConfigError;
use recast_config::model::{RecastConfig, StorageBackend};
use recast_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_recast_config() {
    let toml = r#"
[app]
log_level = "debug"

[storage]
backend = "memory"
database_path = "/tmp/recast-test.db"

[exclusion]
key_prefix = "excl_"

[media]
key_prefix = "med_"
persist_cache = false
marker_class = "recycled"

[parser]
pattern = "[a-z]+"
exclusion_tokens = ["the", "a"]

[processor]
blocked_keywords = ["refund"]

[queue]
storage_key = "outbox"
retry_limit = 5
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.storage.database_path, "/tmp/recast-test.db");
    assert_eq!(config.exclusion.key_prefix, "excl_");
    assert_eq!(config.media.key_prefix, "med_");
    assert!(!config.media.persist_cache);
    assert_eq!(config.media.marker_class, "recycled");
    assert_eq!(config.parser.pattern, "[a-z]+");
    assert_eq!(config.parser.exclusion_tokens, vec!["the", "a"]);
    assert_eq!(config.processor.blocked_keywords, vec!["refund"]);
    assert_eq!(config.queue.storage_key, "outbox");
    assert_eq!(config.queue.retry_limit, 5);
}

/// An empty document yields the compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.app.log_level, "info");
    assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    assert_eq!(config.exclusion.key_prefix, "exclusion_");
    assert_eq!(config.media.key_prefix, "media_");
    assert!(config.media.persist_cache);
    assert_eq!(config.parser.pattern, r"\w+");
    assert!(config.parser.exclusion_tokens.is_empty());
    assert_eq!(config.queue.storage_key, "message_queue");
    assert_eq!(config.queue.retry_limit, 3);
}

/// Unknown keys become UnknownKey diagnostics with a suggestion.
#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[queue]
retry_limt = 4
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("should contain an UnknownKey error");
    assert_eq!(unknown.0, "retry_limt");
    assert_eq!(unknown.1.as_deref(), Some("retry_limit"));
}

/// Unknown top-level sections are rejected too.
#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[notifications]
enabled = true
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Wrong value types surface as InvalidType.
#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[queue]
retry_limit = "three"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject string retry limit");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

/// Semantic validation runs after a successful parse.
#[test]
fn invalid_pattern_is_reported_after_parse() {
    let toml = r#"
[parser]
pattern = "(["
"#;
    let errors = load_and_validate_str(toml).expect_err("pattern should not compile");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

/// Environment variables override file values for the right section.
#[test]
fn env_vars_override_file_values() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[queue]
retry_limit = 2

[storage]
backend = "memory"
"#,
        )?;
        jail.set_env("RECAST_QUEUE_RETRY_LIMIT", "7");
        jail.set_env("RECAST_QUEUE_STORAGE_KEY", "jobs");

        let config: RecastConfig = load_and_validate_path(std::path::Path::new("custom.toml"))
            .map_err(|errors| format!("{errors:?}"))?;
        assert_eq!(config.queue.retry_limit, 7);
        assert_eq!(config.queue.storage_key, "jobs");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        Ok(())
    });
}
