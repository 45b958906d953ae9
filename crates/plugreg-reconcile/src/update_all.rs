// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Refreshing every registered module from a folder of built modules.
//!
//! Each registered module with a matching `{folder}/{name}.{extension}` file is
//! re-probed and reconciled keeping exactly the types already registered, so
//! the binary and version move forward while the registration set stays put.

use std::path::PathBuf;

use plugreg_config::PlugregConfig;
use plugreg_core::{same_name, ConflictDecider, ModuleRecord, PlugregError, ValidationFailure};
use tracing::{info, warn};

use crate::plan::{PlanSummary, Selection};
use crate::reconciler::Reconciler;
use crate::report::ExecutionReport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAllOptions {
    pub plugins_folder: PathBuf,
    pub extension: String,
    /// Module names to leave alone, compared ignoring case.
    pub excluded_modules: Vec<String>,
}

impl UpdateAllOptions {
    pub fn from_config(config: &PlugregConfig) -> Self {
        Self {
            plugins_folder: PathBuf::from(&config.registration.plugins_folder),
            extension: config.probe.extension.clone(),
            excluded_modules: config.registration.excluded_modules.clone(),
        }
    }

    fn is_excluded(&self, module: &ModuleRecord) -> bool {
        self.excluded_modules
            .iter()
            .any(|name| same_name(name, &module.name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Excluded,
    System,
    NoLocalFile,
}

#[derive(Debug, Clone)]
pub struct ModuleUpdate {
    pub module: String,
    pub plan: PlanSummary,
    pub report: ExecutionReport,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub updated: Vec<ModuleUpdate>,
    pub skipped: Vec<(String, SkipReason)>,
    pub failed: Vec<(String, PlugregError)>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.updated.iter().all(|u| u.report.is_clean())
    }
}

/// Updates every registered module found in the plugins folder.
///
/// Only listing the catalog can fail the batch; per-module failures land in
/// [`BatchReport::failed`].
pub async fn update_all(
    reconciler: &Reconciler,
    options: &UpdateAllOptions,
    decider: &dyn ConflictDecider,
) -> Result<BatchReport, PlugregError> {
    let modules = reconciler.engine().catalog().list_modules().await?;
    let mut batch = BatchReport::default();

    for module in modules {
        if options.is_excluded(&module) {
            batch.skipped.push((module.name, SkipReason::Excluded));
            continue;
        }
        if module.is_system {
            batch.skipped.push((module.name, SkipReason::System));
            continue;
        }

        let path = options
            .plugins_folder
            .join(format!("{}.{}", module.name, options.extension));
        if !reconciler.probe().source().exists(&path) {
            info!(module = %module.name, path = %path.display(), "no local build, skipping");
            batch.skipped.push((module.name, SkipReason::NoLocalFile));
            continue;
        }

        match update_one(reconciler, &path, &module, decider).await {
            Ok(update) => batch.updated.push(update),
            Err(e) => {
                warn!(module = %module.name, error = %e, "module update failed");
                batch.failed.push((module.name, e));
            }
        }
    }

    info!(
        updated = batch.updated.len(),
        skipped = batch.skipped.len(),
        failed = batch.failed.len(),
        "batch update finished"
    );
    Ok(batch)
}

async fn update_one(
    reconciler: &Reconciler,
    path: &std::path::Path,
    registered: &ModuleRecord,
    decider: &dyn ConflictDecider,
) -> Result<ModuleUpdate, PlugregError> {
    let local = reconciler.probe().discover(path)?;
    if !same_name(&local.module.name, &registered.name) {
        return Err(ValidationFailure::ModuleNameMismatch {
            registered: registered.name.clone(),
            found: local.module.name.clone(),
        }
        .into());
    }
    let remote = reconciler
        .engine()
        .catalog()
        .fetch_catalog(&registered.name)
        .await?;

    let selection = match &remote {
        Some(remote) => Selection::names(
            local
                .plugins
                .iter()
                .filter(|plugin| remote.find(&plugin.type_name).is_some())
                .map(|plugin| plugin.type_name.as_str()),
        ),
        None => Selection::names(std::iter::empty::<&str>()),
    };
    let isolation = remote
        .as_ref()
        .map_or(registered.isolation_mode, |remote| remote.module.isolation_mode);

    let (plan, report) = reconciler
        .engine()
        .reconcile(remote.as_ref(), &local, &selection, isolation, decider)
        .await?;
    Ok(ModuleUpdate {
        module: registered.name.clone(),
        plan: plan.summary(),
        report,
    })
}
