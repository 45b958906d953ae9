// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module inspection and plugin discovery.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use plugreg_config::PlugregConfig;
use plugreg_core::types::{default_group_name, name_key};
use plugreg_core::{
    ClassificationWarning, DiskSource, Isolatable, LocalState, ModuleRecord, ModuleSource,
    ModuleVersion, PluginDescriptor, PluginKind, PlugregError, SourceKind,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classify::{
    classify, Classification, ClassifierRules, PluginContract, LEGACY_PROTOCOL_VERSION,
};
use crate::context::LoadContext;
use crate::image::{InterfaceRef, ModuleImage, ModuleReference};
use crate::resolver::ModuleResolver;

/// A module the inspected one depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedReference {
    pub reference: String,
    /// Version found on the probe path; `None` when unresolvable.
    pub resolved: Option<ModuleVersion>,
}

/// Loads module images in isolated contexts and classifies their types.
pub struct ModuleProbe {
    source: Arc<dyn ModuleSource>,
    resolver: Arc<ModuleResolver>,
    rules: ClassifierRules,
}

impl ModuleProbe {
    pub fn new(
        source: Arc<dyn ModuleSource>,
        resolver: Arc<ModuleResolver>,
        rules: ClassifierRules,
    ) -> Self {
        Self {
            source,
            resolver,
            rules,
        }
    }

    /// Probe over the local filesystem with the configured search path and rules.
    pub fn from_config(config: &PlugregConfig) -> Self {
        let source: Arc<dyn ModuleSource> = Arc::new(DiskSource);
        let resolver = Arc::new(ModuleResolver::from_config(&config.probe, Arc::clone(&source)));
        Self::new(source, resolver, ClassifierRules::from(&config.classifier))
    }

    pub fn resolver(&self) -> &Arc<ModuleResolver> {
        &self.resolver
    }

    pub fn source(&self) -> &Arc<dyn ModuleSource> {
        &self.source
    }

    /// Reads the identity of the module at `path`.
    pub fn inspect(&self, path: &Path) -> Result<ModuleRecord, PlugregError> {
        let (_ctx, image) = self.open(path)?;
        Ok(module_record(&image, path))
    }

    /// Resolves every module the image at `path` references.
    ///
    /// Unresolvable references are reported, not failed.
    pub fn references(&self, path: &Path) -> Result<Vec<ResolvedReference>, PlugregError> {
        let (ctx, image) = self.open(path)?;
        let resolved = image
            .references
            .iter()
            .map(|reference| {
                let resolved = ctx.load_reference(reference).map(|found| found.version);
                if resolved.is_none() {
                    debug!(module = %image.name, %reference, "referenced module not found");
                }
                ResolvedReference {
                    reference: reference.clone(),
                    resolved,
                }
            })
            .collect();
        Ok(resolved)
    }

    /// Inspects the module and classifies every exported type.
    ///
    /// Problems with individual types become warnings; only failing to load
    /// the module itself is an error.
    pub fn discover(&self, path: &Path) -> Result<LocalState, PlugregError> {
        let (ctx, image) = self.open(path)?;
        let mut module = module_record(&image, path);
        let group_name = default_group_name(&image.name, &image.version);

        let mut plugins = Vec::new();
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for shape in &image.types {
            let (kind, isolatable, protocol) = match classify(shape, &self.rules) {
                Classification::Ignored => continue,
                Classification::WorkflowActivity => {
                    (PluginKind::WorkflowActivity, Isolatable::Yes, None)
                }
                Classification::Plugin {
                    isolatable,
                    contract,
                } => {
                    let protocol = match contract {
                        PluginContract::Legacy => LEGACY_PROTOCOL_VERSION,
                        PluginContract::Current(interface) => {
                            match protocol_version(interface, &ctx) {
                                Ok(version) => version,
                                Err(message) => {
                                    warn!(type_name = %shape.full_name, %message, "skipping plugin type");
                                    warnings.push(ClassificationWarning {
                                        type_name: shape.full_name.clone(),
                                        message,
                                    });
                                    continue;
                                }
                            }
                        }
                    };
                    (PluginKind::Plugin, isolatable, Some(protocol))
                }
            };

            if !seen.insert(name_key(&shape.full_name)) {
                warnings.push(ClassificationWarning {
                    type_name: shape.full_name.clone(),
                    message: "type name differs from an earlier type only by case".to_string(),
                });
                continue;
            }

            if protocol.is_some() {
                module.protocol_version = protocol;
            }

            plugins.push(PluginDescriptor {
                id: Uuid::new_v4(),
                type_name: shape.full_name.clone(),
                display_name: shape.full_name.clone(),
                kind,
                isolatable,
                workflow_group: (kind == PluginKind::WorkflowActivity).then(|| group_name.clone()),
                module_id: module.id,
            });
        }

        info!(
            module = %module.name,
            version = %module.version,
            plugins = plugins.len(),
            warnings = warnings.len(),
            "module discovered"
        );

        Ok(LocalState {
            module,
            plugins,
            warnings,
        })
    }

    fn open(&self, path: &Path) -> Result<(LoadContext, Arc<ModuleImage>), PlugregError> {
        if !self.source.exists(path) {
            return Err(PlugregError::PathNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut ctx = LoadContext::new(Arc::clone(&self.source));
        ctx.attach(Arc::clone(&self.resolver));
        let image = ctx.load_from(path)?;
        Ok((ctx, image))
    }
}

/// Protocol version of the module declaring `interface`, as (major, minor).
fn protocol_version(interface: &InterfaceRef, ctx: &LoadContext) -> Result<(u16, u16), String> {
    let reference = ModuleReference::parse(&interface.module).map_err(|e| e.to_string())?;
    if let Some(version) = reference.version {
        return Ok(version.major_minor());
    }

    debug!(module = %interface.module, "declaring module reference has no version, resolving");
    ctx.load_reference(&interface.module)
        .map(|image| image.version.major_minor())
        .ok_or_else(|| {
            format!(
                "cannot resolve module `{}` declaring {}",
                interface.module, interface.full_name
            )
        })
}

fn module_record(image: &ModuleImage, path: &Path) -> ModuleRecord {
    let mut module = ModuleRecord::new(image.name.clone(), image.version);
    module.culture = image.culture_label().to_string();
    module.signing_token = image.signing_token();
    module.source_kind = SourceKind::Disk;
    module.server_file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    module
}
