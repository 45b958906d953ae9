// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diffing a discovered module against its registration.
//!
//! [`build_plan`] partitions the local descriptors against the remote set and
//! runs every validation gate before anything is mutated. A returned [`Plan`]
//! is always executable; a gate failure is returned as [`ValidationFailure`].

use std::collections::HashSet;
use std::fmt;

use plugreg_core::{
    name_key, ClassificationWarning, IsolationMode, Isolatable, LocalState, ModuleRecord, PluginDescriptor,
    PluginKind, RemoteState, ValidationFailure,
};
use uuid::Uuid;

/// Which local type names the caller wants registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every discovered type.
    All,
    /// Case-folded type names (see [`name_key`]).
    Names(HashSet<String>),
}

impl Selection {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Names(
            names
                .into_iter()
                .map(|name| name_key(name.as_ref()))
                .collect(),
        )
    }

    pub fn contains(&self, type_name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Names(names) => names.contains(&name_key(type_name)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleAction {
    Create,
    Update { remote_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterAction {
    Create,
    Update { remote_id: Uuid },
}

/// A descriptor to create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterEntry {
    pub descriptor: PluginDescriptor,
    pub action: RegisterAction,
}

impl RegisterEntry {
    pub fn type_name(&self) -> &str {
        &self.descriptor.type_name
    }
}

/// A workflow activity whose group follows the module to its new version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRename {
    pub type_name: String,
    pub from: String,
    pub to: String,
}

/// A validated set of catalog operations for one module.
#[derive(Debug, Clone)]
pub struct Plan {
    /// The module record to write; for updates it carries the remote id.
    pub module: ModuleRecord,
    pub module_action: ModuleAction,
    pub isolation: IsolationMode,
    pub to_register: Vec<RegisterEntry>,
    pub to_remove: Vec<PluginDescriptor>,
    pub group_renames: Vec<GroupRename>,
    pub warnings: Vec<ClassificationWarning>,
}

impl Plan {
    pub fn summary(&self) -> PlanSummary {
        let updates = self
            .to_register
            .iter()
            .filter(|entry| matches!(entry.action, RegisterAction::Update { .. }))
            .count();
        PlanSummary {
            module_name: self.module.name.clone(),
            version: self.module.version.to_string(),
            module_action: self.module_action,
            creates: self.to_register.len() - updates,
            updates,
            removes: self.to_remove.len(),
        }
    }
}

/// Counts describing a plan, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub module_name: String,
    pub version: String,
    pub module_action: ModuleAction,
    pub creates: usize,
    pub updates: usize,
    pub removes: usize,
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.module_action {
            ModuleAction::Create => "create",
            ModuleAction::Update { .. } => "update",
        };
        write!(
            f,
            "{action} module {} {}: {} to create, {} to update, {} to remove",
            self.module_name, self.version, self.creates, self.updates, self.removes
        )
    }
}

/// Partitions `local` against `remote` and validates the result.
///
/// Gates run in a fixed order and the first failure wins: missing remote
/// descriptors, isolation support, signing, version compatibility, and
/// finally an empty selection.
pub fn build_plan(
    remote: Option<&RemoteState>,
    local: &LocalState,
    selection: &Selection,
    isolation: IsolationMode,
) -> Result<Plan, ValidationFailure> {
    let mut to_register = Vec::new();
    let mut to_remove = Vec::new();
    let mut group_renames = Vec::new();

    let new_group = local.module.default_group_name();
    let old_group = remote.map(|remote| remote.module.default_group_name());

    for local_plugin in &local.plugins {
        let registered = remote.and_then(|remote| remote.find(&local_plugin.type_name));
        let selected = selection.contains(&local_plugin.type_name);

        match (registered, selected) {
            (Some(registered), true) => {
                let mut descriptor = local_plugin.clone();
                descriptor.id = registered.id;

                if descriptor.kind == PluginKind::WorkflowActivity {
                    let follows_module = registered.workflow_group.is_some()
                        && registered.workflow_group == old_group;
                    if follows_module {
                        if registered.workflow_group.as_deref() != Some(new_group.as_str()) {
                            group_renames.push(GroupRename {
                                type_name: descriptor.type_name.clone(),
                                from: registered.workflow_group.clone().unwrap_or_default(),
                                to: new_group.clone(),
                            });
                        }
                        descriptor.workflow_group = Some(new_group.clone());
                    } else if registered.workflow_group.is_some() {
                        descriptor.workflow_group = registered.workflow_group.clone();
                    }
                }

                to_register.push(RegisterEntry {
                    descriptor,
                    action: RegisterAction::Update {
                        remote_id: registered.id,
                    },
                });
            }
            (None, true) => to_register.push(RegisterEntry {
                descriptor: local_plugin.clone(),
                action: RegisterAction::Create,
            }),
            (Some(registered), false) => to_remove.push(registered.clone()),
            (None, false) => {}
        }
    }

    if let Some(remote) = remote {
        let missing: Vec<String> = remote
            .plugins
            .iter()
            .filter(|plugin| local.find(&plugin.type_name).is_none())
            .map(|plugin| plugin.type_name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationFailure::MissingRemoteDescriptor { names: missing });
        }
    }

    if isolation == IsolationMode::Sandbox {
        let unsupported: Vec<String> = to_register
            .iter()
            .filter(|entry| {
                entry.descriptor.is_plugin() && entry.descriptor.isolatable == Isolatable::No
            })
            .map(|entry| entry.descriptor.type_name.clone())
            .collect();
        if !unsupported.is_empty() {
            return Err(ValidationFailure::IsolationUnsupported { names: unsupported });
        }
    }

    let registers_plugins = to_register.iter().any(|entry| entry.descriptor.is_plugin());
    if registers_plugins && !local.module.is_signed() {
        return Err(ValidationFailure::MissingSigningKey {
            module: local.module.name.clone(),
        });
    }

    if let Some(remote) = remote {
        if !remote.module.version.is_compatible_with(&local.module.version) {
            return Err(ValidationFailure::VersionIncompatible {
                registered: remote.module.version,
                candidate: local.module.version,
            });
        }
    }

    if to_register.is_empty() {
        return Err(ValidationFailure::NothingSelected);
    }

    let mut module = local.module.clone();
    module.isolation_mode = isolation;
    let module_action = match remote {
        Some(remote) => {
            module.id = remote.module.id;
            module.is_system = remote.module.is_system;
            ModuleAction::Update {
                remote_id: remote.module.id,
            }
        }
        None => ModuleAction::Create,
    };
    for entry in &mut to_register {
        entry.descriptor.module_id = module.id;
    }

    Ok(Plan {
        module,
        module_action,
        isolation,
        to_register,
        to_remove,
        group_renames,
        warnings: local.warnings.clone(),
    })
}
