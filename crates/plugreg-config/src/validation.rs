// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::PlugregConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &PlugregConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` must be one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let extension = config.probe.extension.trim();
    if extension.is_empty() {
        errors.push(ConfigError::Validation {
            message: "probe.extension must not be empty".to_string(),
        });
    } else if extension.starts_with('.') {
        errors.push(ConfigError::Validation {
            message: format!("probe.extension `{extension}` must not start with a dot"),
        });
    }

    if config.probe.subdirectories.is_empty() {
        errors.push(ConfigError::Validation {
            message: "probe.subdirectories must contain at least one entry (use \"\" for the base directory)"
                .to_string(),
        });
    }

    let classifier = &config.classifier;
    if classifier.plugin_interface.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "classifier.plugin_interface must not be empty".to_string(),
        });
    }
    if classifier.legacy_plugin_interface.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "classifier.legacy_plugin_interface must not be empty".to_string(),
        });
    }
    if classifier
        .plugin_interface
        .eq_ignore_ascii_case(&classifier.legacy_plugin_interface)
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "classifier.plugin_interface and classifier.legacy_plugin_interface are both `{}`",
                classifier.plugin_interface
            ),
        });
    }
    for (i, base) in classifier.workflow_base_types.iter().enumerate() {
        if base.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("classifier.workflow_base_types[{i}] must not be empty"),
            });
        }
    }

    if config.registration.concurrency == 0 {
        errors.push(ConfigError::Validation {
            message: "registration.concurrency must be at least 1".to_string(),
        });
    }

    if config.registration.catalog_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "registration.catalog_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
