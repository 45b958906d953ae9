// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plugreg register` and `plugreg update-all`.
//!
//! Both open the catalog snapshot named by `registration.catalog_path` and
//! write it back after executing, including after partial failures: committed
//! catalog changes are never rolled back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use plugreg_config::PlugregConfig;
use plugreg_core::{
    ConflictDecision, FixedDecision, IsolationMode, PluginCatalog, PlugregError,
};
use plugreg_reconcile::{
    update_all, BatchReport, MemoryCatalog, Reconciler, Selection, SkipReason, UpdateAllOptions,
};
use tracing::info;

use crate::output;

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub path: PathBuf,
    pub select: Vec<String>,
    pub all: bool,
    pub isolation: IsolationMode,
    pub on_conflict: ConflictDecision,
    pub dry_run: bool,
}

impl RegisterRequest {
    fn selection(&self) -> Selection {
        if self.all {
            Selection::All
        } else {
            Selection::names(&self.select)
        }
    }
}

async fn open_catalog(config: &PlugregConfig) -> Result<Arc<MemoryCatalog>, PlugregError> {
    let path = Path::new(&config.registration.catalog_path);
    info!(path = %path.display(), "opening catalog");
    Ok(Arc::new(MemoryCatalog::open(path).await?))
}

pub async fn run_register(
    config: &PlugregConfig,
    request: RegisterRequest,
    use_color: bool,
) -> Result<(), PlugregError> {
    let catalog = open_catalog(config).await?;
    let reconciler =
        Reconciler::from_config(config, Arc::clone(&catalog) as Arc<dyn PluginCatalog>);
    let selection = request.selection();

    let plan = reconciler
        .plan_only(&request.path, &selection, request.isolation)
        .await?;
    output::print_plan(&plan, use_color);
    if request.dry_run {
        return Ok(());
    }

    let decider = FixedDecision(request.on_conflict);
    let report = reconciler.engine().execute(&plan, &decider).await?;
    catalog.persist().await?;
    output::print_report(&report, use_color);

    if report.errored > 0 || report.cancelled {
        return Err(PlugregError::catalog(format!(
            "registration incomplete: {report}"
        )));
    }
    Ok(())
}

pub async fn run_update_all(
    config: &PlugregConfig,
    plugins_folder: Option<PathBuf>,
    on_conflict: ConflictDecision,
    use_color: bool,
) -> Result<(), PlugregError> {
    let catalog = open_catalog(config).await?;
    let reconciler =
        Reconciler::from_config(config, Arc::clone(&catalog) as Arc<dyn PluginCatalog>);
    let mut options = UpdateAllOptions::from_config(config);
    if let Some(folder) = plugins_folder {
        options.plugins_folder = folder;
    }

    let batch = update_all(&reconciler, &options, &FixedDecision(on_conflict)).await?;
    catalog.persist().await?;
    print_batch(&batch, use_color);

    if batch.is_clean() {
        Ok(())
    } else {
        Err(PlugregError::catalog(format!(
            "{} module(s) failed to update",
            batch.failed.len()
        )))
    }
}

fn print_batch(batch: &BatchReport, use_color: bool) {
    for update in &batch.updated {
        println!("{}", update.plan);
        output::print_report(&update.report, use_color);
    }
    for (module, reason) in &batch.skipped {
        let why = match reason {
            SkipReason::Excluded => "excluded by configuration",
            SkipReason::System => "system module",
            SkipReason::NoLocalFile => "no build in plugins folder",
        };
        println!("skipped {module}: {why}");
    }
    for (module, error) in &batch.failed {
        println!("failed {module}: {error}");
    }
}
