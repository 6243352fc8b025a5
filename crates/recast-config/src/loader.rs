// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./recast.toml` > `~/.config/recast/recast.toml` > `/etc/recast/recast.toml`
//! with environment variable overrides via `RECAST_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::RecastConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/recast/recast.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "recast.toml";

/// Sections that env var names are split on, in match order.
const ENV_SECTIONS: &[&str] = &[
    "app", "storage", "exclusion", "media", "parser", "processor", "queue",
];

/// Path of the per-user config file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("recast").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/recast/recast.toml` (system-wide)
/// 3. `~/.config/recast/recast.toml` (user XDG config)
/// 4. `./recast.toml` (local directory)
/// 5. `RECAST_*` environment variables
pub fn load_config() -> Result<RecastConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<RecastConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RecastConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RecastConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RecastConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RecastConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping `RECAST_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `RECAST_QUEUE_RETRY_LIMIT` maps to `queue.retry_limit`.
fn env_provider() -> Env {
    Env::prefixed("RECAST_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name onto a dotted config path.
pub fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
