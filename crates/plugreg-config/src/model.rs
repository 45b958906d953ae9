// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for plugreg.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use plugreg_core::IsolationMode;
use serde::{Deserialize, Serialize};

/// Top-level plugreg configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlugregConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Module resolution search path.
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Type classification rules.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Registration behaviour against the catalog.
    #[serde(default)]
    pub registration: RegistrationConfig,
}

impl PlugregConfig {
    /// Renders the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Directories and file naming used when resolving module references.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// Base directories probed in priority order. Empty means the built-in
    /// defaults (see [`ProbeConfig::effective_base_directories`]).
    #[serde(default)]
    pub base_directories: Vec<PathBuf>,

    /// Subdirectories tried under every base directory, in order.
    /// The empty string stands for the base directory itself.
    #[serde(default = "default_subdirectories")]
    pub subdirectories: Vec<String>,

    /// File extension of module images, without the leading dot.
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_directories: Vec::new(),
            subdirectories: default_subdirectories(),
            extension: default_extension(),
        }
    }
}

impl ProbeConfig {
    /// Configured base directories, or the defaults when none are set.
    ///
    /// Defaults: the executable's directory, its `plugins` folder, the
    /// working directory and its `plugins` folder. Duplicates are dropped
    /// while keeping first-seen order.
    pub fn effective_base_directories(&self) -> Vec<PathBuf> {
        if !self.base_directories.is_empty() {
            return self.base_directories.clone();
        }

        let mut roots = Vec::new();
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
        {
            roots.push(exe_dir);
        }
        if let Ok(cwd) = std::env::current_dir() {
            roots.push(cwd);
        }

        let mut dirs = Vec::new();
        for root in roots {
            for candidate in [root.clone(), root.join("plugins")] {
                if !dirs.contains(&candidate) {
                    dirs.push(candidate);
                }
            }
        }
        dirs
    }
}

fn default_subdirectories() -> Vec<String> {
    vec![String::new(), "x86_64".to_string(), "x86".to_string()]
}

fn default_extension() -> String {
    "module".to_string()
}

/// Names of the contracts that make a type registrable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Fully qualified name of the current plugin execution interface.
    #[serde(default = "default_plugin_interface")]
    pub plugin_interface: String,

    /// Fully qualified name of the legacy plugin interface (no isolation support).
    #[serde(default = "default_legacy_plugin_interface")]
    pub legacy_plugin_interface: String,

    /// Base types whose descendants are workflow activities.
    #[serde(default = "default_workflow_base_types")]
    pub workflow_base_types: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            plugin_interface: default_plugin_interface(),
            legacy_plugin_interface: default_legacy_plugin_interface(),
            workflow_base_types: default_workflow_base_types(),
        }
    }
}

fn default_plugin_interface() -> String {
    "Plugreg.Sdk.IPlugin".to_string()
}

fn default_legacy_plugin_interface() -> String {
    "Plugreg.Sdk.Legacy.IPlugin".to_string()
}

fn default_workflow_base_types() -> Vec<String> {
    vec![
        "Plugreg.Workflow.CodeActivity".to_string(),
        "Plugreg.Workflow.Activity".to_string(),
    ]
}

/// Registration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationConfig {
    /// JSON snapshot file backing the local catalog.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Folder scanned by `update-all` for refreshed module images.
    #[serde(default = "default_plugins_folder")]
    pub plugins_folder: String,

    /// Isolation mode used when the command line does not choose one.
    #[serde(default)]
    pub default_isolation: IsolationMode,

    /// Maximum number of descriptor mutations in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Module names never touched by `update-all` (case-insensitive).
    #[serde(default)]
    pub excluded_modules: Vec<String>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            plugins_folder: default_plugins_folder(),
            default_isolation: IsolationMode::None,
            concurrency: default_concurrency(),
            excluded_modules: Vec::new(),
        }
    }
}

fn default_catalog_path() -> String {
    "plugreg-catalog.json".to_string()
}

fn default_plugins_folder() -> String {
    "plugins".to_string()
}

fn default_concurrency() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_base_directories_win() {
        let probe = ProbeConfig {
            base_directories: vec![PathBuf::from("/opt/a"), PathBuf::from("/opt/b")],
            ..ProbeConfig::default()
        };
        assert_eq!(
            probe.effective_base_directories(),
            vec![PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]
        );
    }

    #[test]
    fn default_base_directories_include_plugins_folders() {
        let dirs = ProbeConfig::default().effective_base_directories();
        assert!(!dirs.is_empty());
        assert!(dirs.iter().any(|d| d.ends_with("plugins")));

        let mut deduped = dirs.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), dirs.len());
    }

    #[test]
    fn default_subdirectories_start_with_base() {
        let probe = ProbeConfig::default();
        assert_eq!(probe.subdirectories[0], "");
        assert_eq!(probe.extension, "module");
    }
}
