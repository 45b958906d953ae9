// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Probe, fetch, plan, and execute for one module file.

use std::path::Path;
use std::sync::Arc;

use plugreg_config::PlugregConfig;
use plugreg_core::{
    ConflictDecider, IsolationMode, LocalState, PluginCatalog, PlugregError, RemoteState,
};
use plugreg_probe::ModuleProbe;
use tracing::info;

use crate::engine::ReconciliationEngine;
use crate::plan::{Plan, PlanSummary, Selection};
use crate::report::ExecutionReport;

/// Result of a completed sync.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub plan: PlanSummary,
    pub report: ExecutionReport,
}

/// Ties a [`ModuleProbe`] to a [`ReconciliationEngine`].
pub struct Reconciler {
    probe: ModuleProbe,
    engine: ReconciliationEngine,
}

impl Reconciler {
    pub fn new(probe: ModuleProbe, engine: ReconciliationEngine) -> Self {
        Self { probe, engine }
    }

    pub fn from_config(config: &PlugregConfig, catalog: Arc<dyn PluginCatalog>) -> Self {
        Self::new(
            ModuleProbe::from_config(config),
            ReconciliationEngine::from_config(catalog, &config.registration),
        )
    }

    pub fn probe(&self) -> &ModuleProbe {
        &self.probe
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Discovers the module at `path` and fetches its current registration.
    pub async fn load(
        &self,
        path: &Path,
    ) -> Result<(LocalState, Option<RemoteState>), PlugregError> {
        let local = self.probe.discover(path)?;
        let remote = self
            .engine
            .catalog()
            .fetch_catalog(&local.module.name)
            .await?;
        Ok((local, remote))
    }

    /// Builds the plan a sync would execute, without mutating anything.
    pub async fn plan_only(
        &self,
        path: &Path,
        selection: &Selection,
        isolation: IsolationMode,
    ) -> Result<Plan, PlugregError> {
        let (local, remote) = self.load(path).await?;
        self.engine
            .plan(remote.as_ref(), &local, selection, isolation)
    }

    pub async fn sync(
        &self,
        path: &Path,
        selection: &Selection,
        isolation: IsolationMode,
        decider: &dyn ConflictDecider,
    ) -> Result<SyncOutcome, PlugregError> {
        let (local, remote) = self.load(path).await?;
        info!(
            module = %local.module.name,
            registered = remote.is_some(),
            "reconciling module"
        );
        let (plan, report) = self
            .engine
            .reconcile(remote.as_ref(), &local, selection, isolation, decider)
            .await?;
        Ok(SyncOutcome {
            plan: plan.summary(),
            report,
        })
    }
}
