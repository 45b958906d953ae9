// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for plugin discovery and registration.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ModuleVersion;

/// The primary error type used across probing, resolution, and reconciliation.
#[derive(Debug, Error)]
pub enum PlugregError {
    /// The module path handed to the probe does not exist.
    #[error("path not found: {}", path.display())]
    PathNotFound { path: PathBuf },

    /// A file exists but is not a valid module image.
    #[error("invalid module image {}: {reason}", path.display())]
    InvalidBinaryFormat { path: PathBuf, reason: String },

    /// Filesystem access failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration errors (invalid TOML, unknown keys, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A call against the remote catalog failed.
    #[error("catalog error: {message}")]
    Catalog {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The plan violated a consistency invariant and was aborted before any mutation.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlugregError {
    /// Shorthand for a catalog error without an underlying source.
    pub fn catalog(message: impl Into<String>) -> Self {
        PlugregError::Catalog {
            message: message.into(),
            source: None,
        }
    }
}

/// A whole-plan validation failure.
///
/// Each variant names the violated invariant and the descriptors implicated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// Registered descriptors that no longer exist in the local module.
    #[error("descriptors registered remotely are missing from the module: {}", names.join(", "))]
    MissingRemoteDescriptor { names: Vec<String> },

    /// Sandbox isolation was requested but some selected plugins cannot be isolated.
    #[error("sandbox isolation requested but these plugins cannot be isolated: {}", names.join(", "))]
    IsolationUnsupported { names: Vec<String> },

    /// Modules that register plugins must carry a signing token.
    #[error("module `{module}` registers plugins but is not signed")]
    MissingSigningKey { module: String },

    /// Major or minor version changed across an update.
    #[error(
        "version changed from {registered} to {candidate}; only build and revision may change, register a new module instead"
    )]
    VersionIncompatible {
        registered: ModuleVersion,
        candidate: ModuleVersion,
    },

    /// The module file found for a registration defines a different module.
    #[error("file for registered module `{registered}` defines module `{found}`")]
    ModuleNameMismatch { registered: String, found: String },

    /// Nothing left to register after applying the selection.
    #[error("no plugins selected for registration")]
    NothingSelected,
}

/// A non-fatal problem found while classifying one exported type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{type_name}: {message}")]
pub struct ClassificationWarning {
    pub type_name: String,
    pub message: String,
}
