// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./plugreg.toml` > `~/.config/plugreg/plugreg.toml` > `/etc/plugreg/plugreg.toml`
//! with environment variable overrides via `PLUGREG_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PlugregConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plugreg/plugreg.toml` (system-wide)
/// 3. `~/.config/plugreg/plugreg.toml` (user XDG config)
/// 4. `./plugreg.toml` (local directory)
/// 5. `PLUGREG_*` environment variables
pub fn load_config() -> Result<PlugregConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PlugregConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlugregConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PlugregConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlugregConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PlugregConfig::default()))
        .merge(Toml::file("/etc/plugreg/plugreg.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("plugreg/plugreg.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("plugreg.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` because key names contain
/// underscores: `PLUGREG_REGISTRATION_CATALOG_PATH` must map to
/// `registration.catalog_path`, not `registration.catalog.path`.
fn env_provider() -> Env {
    Env::prefixed("PLUGREG_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to its dotted config key.
pub(crate) fn map_env_key(key: &str) -> String {
    key.replacen("logging_", "logging.", 1)
        .replacen("probe_", "probe.", 1)
        .replacen("classifier_", "classifier.", 1)
        .replacen("registration_", "registration.", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_section_only_once() {
        assert_eq!(
            map_env_key("registration_catalog_path"),
            "registration.catalog_path"
        );
        assert_eq!(
            map_env_key("classifier_legacy_plugin_interface"),
            "classifier.legacy_plugin_interface"
        );
        assert_eq!(map_env_key("logging_level"), "logging.level");
    }
}
