// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the probe, the reconciliation engine, and catalogs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::ClassificationWarning;

/// Culture label used when a module is culture-neutral.
pub const NEUTRAL_CULTURE: &str = "neutral";

/// Case-folded key for a type or module name.
///
/// Every case-insensitive name comparison folds through here, so a name
/// that matches a selection also matches its registered counterpart.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Equality of two names under [`name_key`].
pub fn same_name(a: &str, b: &str) -> bool {
    a == b || name_key(a) == name_key(b)
}

/// Four-part module version: `major.minor.build.revision`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl ModuleVersion {
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// True when both versions share major and minor components.
    pub fn is_compatible_with(&self, other: &ModuleVersion) -> bool {
        self.major == other.major && self.minor == other.minor
    }

    /// Returns `(major, minor)`.
    pub fn major_minor(&self) -> (u16, u16) {
        (self.major, self.minor)
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid module version `{0}`")]
pub struct ParseVersionError(pub String);

impl FromStr for ModuleVersion {
    type Err = ParseVersionError;

    /// Parses `a`, `a.b`, `a.b.c` or `a.b.c.d`; missing components are zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed.split('.').collect();
        if trimmed.is_empty() || parts.len() > 4 {
            return Err(ParseVersionError(s.to_string()));
        }

        let mut components = [0u16; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| ParseVersionError(s.to_string()))?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl TryFrom<String> for ModuleVersion {
    type Error = ParseVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleVersion> for String {
    fn from(value: ModuleVersion) -> Self {
        value.to_string()
    }
}

/// Isolation mode requested for a registered module.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    #[default]
    None,
    Sandbox,
}

/// Where the catalog keeps the module binary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Disk,
    #[default]
    Database,
    Memory,
}

/// Kind of a registrable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    Plugin,
    WorkflowActivity,
}

/// Whether a descriptor can run under sandbox isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Isolatable {
    Yes,
    No,
}

/// A registrable module and its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: Uuid,
    pub name: String,
    pub version: ModuleVersion,
    pub culture: String,
    /// Upper-case hex signing token; `None` for unsigned modules.
    pub signing_token: Option<String>,
    #[serde(default)]
    pub isolation_mode: IsolationMode,
    #[serde(default)]
    pub source_kind: SourceKind,
    /// File name kept by the server when the module lives on disk.
    #[serde(default)]
    pub server_file_name: Option<String>,
    /// Plugin protocol version (major, minor) the module was built against.
    #[serde(default)]
    pub protocol_version: Option<(u16, u16)>,
    /// Modules shipped by the platform itself; never touched by batch updates.
    #[serde(default)]
    pub is_system: bool,
}

impl ModuleRecord {
    /// Creates a record with a fresh identity and neutral defaults.
    pub fn new(name: impl Into<String>, version: ModuleVersion) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            version,
            culture: NEUTRAL_CULTURE.to_string(),
            signing_token: None,
            isolation_mode: IsolationMode::None,
            source_kind: SourceKind::Database,
            server_file_name: None,
            protocol_version: None,
            is_system: false,
        }
    }

    /// True when the module carries a non-empty signing token.
    pub fn is_signed(&self) -> bool {
        self.signing_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }

    /// Default workflow group name for activities in this module.
    pub fn default_group_name(&self) -> String {
        default_group_name(&self.name, &self.version)
    }

    /// Full display name in `Name, Version=..., Culture=..., PublicKeyToken=...` form.
    pub fn full_name(&self) -> String {
        format!(
            "{}, Version={}, Culture={}, PublicKeyToken={}",
            self.name,
            self.version,
            self.culture,
            self.signing_token
                .as_deref()
                .map(str::to_ascii_lowercase)
                .unwrap_or_else(|| "null".to_string())
        )
    }
}

/// Derives the default workflow group name for a module.
pub fn default_group_name(module_name: &str, version: &ModuleVersion) -> String {
    format!("{module_name}: Version: {version}")
}

/// A classified plugin or workflow-activity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub id: Uuid,
    /// Fully qualified type name; unique per module ignoring case.
    pub type_name: String,
    pub display_name: String,
    pub kind: PluginKind,
    pub isolatable: Isolatable,
    #[serde(default)]
    pub workflow_group: Option<String>,
    pub module_id: Uuid,
}

impl PluginDescriptor {
    /// Case-insensitive type name comparison.
    pub fn same_type(&self, type_name: &str) -> bool {
        same_name(&self.type_name, type_name)
    }

    pub fn is_plugin(&self) -> bool {
        self.kind == PluginKind::Plugin
    }
}

/// Registered side of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteState {
    pub module: ModuleRecord,
    pub plugins: Vec<PluginDescriptor>,
}

impl RemoteState {
    pub fn find(&self, type_name: &str) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|p| p.same_type(type_name))
    }
}

/// Discovered side of a reconciliation.
#[derive(Debug, Clone)]
pub struct LocalState {
    pub module: ModuleRecord,
    pub plugins: Vec<PluginDescriptor>,
    pub warnings: Vec<ClassificationWarning>,
}

impl LocalState {
    pub fn find(&self, type_name: &str) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|p| p.same_type(type_name))
    }

    /// Type names in discovery order.
    pub fn type_names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.type_name.clone()).collect()
    }
}

/// An entity whose created/modified timestamps need refreshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "entity", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    Module(Uuid),
    Plugin(Uuid),
}

/// A descriptor registered under a different module with the same type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollidingPlugin {
    pub plugin_id: Uuid,
    pub module_id: Uuid,
    pub module_name: String,
}

/// Raised on the create path when another module already registers the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    pub type_name: String,
    pub module_name: String,
    pub existing: CollidingPlugin,
}

/// Answer to a [`NameCollision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ConflictDecision {
    /// Keep the existing registration and reuse its identity. Counted as
    /// skipped; the existing descriptor is neither updated nor touched.
    #[strum(serialize = "reuse")]
    ReuseExisting,
    /// Register a second descriptor with the same name.
    #[strum(serialize = "duplicate")]
    CreateDuplicate,
    /// Stop dispatching the remaining registration work.
    Abort,
}
