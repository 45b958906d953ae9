// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plan execution against a [`PluginCatalog`].
//!
//! The module record is written first, alone. Descriptor creates, updates,
//! and removals are then dispatched concurrently up to the configured limit.
//! A failed item is logged and recorded and never stops the others; nothing
//! is rolled back. Every entity actually mutated gets its timestamps
//! refreshed in one batch at the end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use plugreg_config::model::RegistrationConfig;
use plugreg_core::{
    name_key, ConflictDecider, ConflictDecision, EntityRef, IsolationMode, LocalState, NameCollision,
    PluginCatalog, PluginDescriptor, PlugregError, RemoteState,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::plan::{build_plan, ModuleAction, Plan, RegisterAction, RegisterEntry, Selection};
use crate::report::{ExecutionReport, ItemError, ItemOutcome, ItemStatus, Operation};

/// Plans and executes registrations against one catalog.
pub struct ReconciliationEngine {
    catalog: Arc<dyn PluginCatalog>,
    concurrency: usize,
}

impl ReconciliationEngine {
    pub fn new(catalog: Arc<dyn PluginCatalog>, concurrency: usize) -> Self {
        Self {
            catalog,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(catalog: Arc<dyn PluginCatalog>, config: &RegistrationConfig) -> Self {
        Self::new(catalog, config.concurrency)
    }

    pub fn catalog(&self) -> &Arc<dyn PluginCatalog> {
        &self.catalog
    }

    /// Builds and validates a plan. Performs no catalog calls.
    pub fn plan(
        &self,
        remote: Option<&RemoteState>,
        local: &LocalState,
        selection: &Selection,
        isolation: IsolationMode,
    ) -> Result<Plan, PlugregError> {
        match build_plan(remote, local, selection, isolation) {
            Ok(plan) => {
                for rename in &plan.group_renames {
                    debug!(type_name = %rename.type_name, from = %rename.from, to = %rename.to, "workflow group follows module version");
                }
                info!(summary = %plan.summary(), "plan validated");
                Ok(plan)
            }
            Err(failure) => {
                warn!(module = %local.module.name, error = %failure, "plan rejected");
                Err(failure.into())
            }
        }
    }

    /// Plans and, when valid, executes in one step.
    pub async fn reconcile(
        &self,
        remote: Option<&RemoteState>,
        local: &LocalState,
        selection: &Selection,
        isolation: IsolationMode,
        decider: &dyn ConflictDecider,
    ) -> Result<(Plan, ExecutionReport), PlugregError> {
        let plan = self.plan(remote, local, selection, isolation)?;
        let report = self.execute(&plan, decider).await?;
        Ok((plan, report))
    }

    /// Executes a validated plan.
    ///
    /// Fails only when the module record cannot be written, in which case no
    /// descriptor has been touched. Everything after that is reported.
    pub async fn execute(
        &self,
        plan: &Plan,
        decider: &dyn ConflictDecider,
    ) -> Result<ExecutionReport, PlugregError> {
        let mut report = ExecutionReport::default();

        let module_id = match plan.module_action {
            ModuleAction::Create => {
                let id = self.catalog.create_module(&plan.module).await.map_err(|e| {
                    error!(module = %plan.module.name, error = %e, "module registration failed");
                    e
                })?;
                report.module_created = true;
                info!(module = %plan.module.name, %id, "module registered");
                id
            }
            ModuleAction::Update { remote_id } => {
                self.catalog
                    .update_module(remote_id, &plan.module)
                    .await
                    .map_err(|e| {
                        error!(module = %plan.module.name, error = %e, "module update failed");
                        e
                    })?;
                report.module_updated = true;
                info!(module = %plan.module.name, id = %remote_id, "module updated");
                remote_id
            }
        };
        report.module_id = Some(module_id);

        let run = Run::new(Arc::clone(&self.catalog), module_id, plan.module.name.clone());
        run.touched.lock().await.push(EntityRef::Module(module_id));

        let items = plan
            .to_register
            .iter()
            .map(WorkItem::Register)
            .chain(plan.to_remove.iter().map(WorkItem::Remove));
        stream::iter(items)
            .map(|item| run.dispatch(item, decider))
            .buffer_unordered(self.concurrency)
            .collect::<Vec<()>>()
            .await;

        let touched = std::mem::take(&mut *run.touched.lock().await);
        if let Err(e) = self.catalog.batch_touch_timestamps(&touched).await {
            warn!(module = %plan.module.name, error = %e, "failed to refresh timestamps");
            report.timestamp_error = Some(e.to_string());
        }

        report.created = run.created.load(Ordering::SeqCst);
        report.updated = run.updated.load(Ordering::SeqCst);
        report.skipped = run.skipped.load(Ordering::SeqCst);
        report.removed = run.removed.load(Ordering::SeqCst);
        report.errored = run.errored.load(Ordering::SeqCst);
        report.cancelled = run.cancel.is_cancelled();
        report.items = std::mem::take(&mut *run.outcomes.lock().await);
        report.errors = std::mem::take(&mut *run.errors.lock().await);
        report
            .items
            .sort_by_key(|item| name_key(&item.type_name));
        report
            .errors
            .sort_by_key(|item| name_key(&item.type_name));

        info!(module = %plan.module.name, %report, "execution finished");
        Ok(report)
    }
}

enum WorkItem<'a> {
    Register(&'a RegisterEntry),
    Remove(&'a PluginDescriptor),
}

impl WorkItem<'_> {
    fn type_name(&self) -> &str {
        match self {
            Self::Register(entry) => entry.type_name(),
            Self::Remove(descriptor) => &descriptor.type_name,
        }
    }

    fn operation(&self) -> Operation {
        match self {
            Self::Register(RegisterEntry {
                action: RegisterAction::Create,
                ..
            }) => Operation::Create,
            Self::Register(_) => Operation::Update,
            Self::Remove(_) => Operation::Remove,
        }
    }
}

/// Shared state of one execution.
struct Run {
    catalog: Arc<dyn PluginCatalog>,
    module_id: Uuid,
    module_name: String,
    cancel: CancellationToken,
    decisions: DashMap<String, Arc<Mutex<Option<ConflictDecision>>>>,
    created: AtomicUsize,
    updated: AtomicUsize,
    skipped: AtomicUsize,
    removed: AtomicUsize,
    errored: AtomicUsize,
    outcomes: Mutex<Vec<ItemOutcome>>,
    errors: Mutex<Vec<ItemError>>,
    touched: Mutex<Vec<EntityRef>>,
}

impl Run {
    fn new(catalog: Arc<dyn PluginCatalog>, module_id: Uuid, module_name: String) -> Self {
        Self {
            catalog,
            module_id,
            module_name,
            cancel: CancellationToken::new(),
            decisions: DashMap::new(),
            created: AtomicUsize::new(0),
            updated: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
            errored: AtomicUsize::new(0),
            outcomes: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            touched: Mutex::new(Vec::new()),
        }
    }

    async fn dispatch(&self, item: WorkItem<'_>, decider: &dyn ConflictDecider) {
        let type_name = item.type_name().to_string();
        let operation = item.operation();

        if self.cancel.is_cancelled() {
            debug!(%type_name, "not dispatched after abort");
            self.record(type_name, operation, ItemStatus::Cancelled).await;
            return;
        }

        let result = match item {
            WorkItem::Register(entry) => match entry.action {
                RegisterAction::Update { remote_id } => self.update(remote_id, entry).await,
                RegisterAction::Create => self.create(entry, decider).await,
            },
            WorkItem::Remove(descriptor) => self.remove(descriptor).await,
        };

        match result {
            Ok(status) => self.record(type_name, operation, status).await,
            Err(e) => {
                error!(module = %self.module_name, %type_name, %operation, error = %e, "catalog operation failed");
                self.errored.fetch_add(1, Ordering::SeqCst);
                self.errors.lock().await.push(ItemError {
                    type_name: type_name.clone(),
                    operation,
                    message: e.to_string(),
                });
                self.record(type_name, operation, ItemStatus::Failed).await;
            }
        }
    }

    async fn update(&self, id: Uuid, entry: &RegisterEntry) -> Result<ItemStatus, PlugregError> {
        self.catalog.update_plugin(id, &entry.descriptor).await?;
        self.updated.fetch_add(1, Ordering::SeqCst);
        self.touched.lock().await.push(EntityRef::Plugin(id));
        debug!(type_name = %entry.type_name(), %id, "plugin updated");
        Ok(ItemStatus::Updated(id))
    }

    async fn create(
        &self,
        entry: &RegisterEntry,
        decider: &dyn ConflictDecider,
    ) -> Result<ItemStatus, PlugregError> {
        let mut descriptor = entry.descriptor.clone();
        descriptor.module_id = self.module_id;

        let colliding = self
            .catalog
            .find_colliding_plugin(&descriptor.type_name, self.module_id)
            .await?;
        if let Some(existing) = colliding {
            let collision = NameCollision {
                type_name: descriptor.type_name.clone(),
                module_name: self.module_name.clone(),
                existing,
            };
            match self.decide(&collision, decider).await {
                ConflictDecision::ReuseExisting => {
                    self.skipped.fetch_add(1, Ordering::SeqCst);
                    info!(type_name = %collision.type_name, owner = %collision.existing.module_name, "reusing existing registration");
                    return Ok(ItemStatus::Reused(collision.existing.plugin_id));
                }
                ConflictDecision::Abort => {
                    warn!(type_name = %collision.type_name, "registration aborted on name collision");
                    self.cancel.cancel();
                    return Ok(ItemStatus::Cancelled);
                }
                ConflictDecision::CreateDuplicate => {
                    debug!(type_name = %collision.type_name, "creating duplicate registration");
                }
            }
        }

        // Another item may have aborted while the collision lookup was pending.
        if self.cancel.is_cancelled() {
            debug!(type_name = %descriptor.type_name, "create withheld after abort");
            return Ok(ItemStatus::Cancelled);
        }

        let id = self.catalog.create_plugin(&descriptor).await?;
        self.created.fetch_add(1, Ordering::SeqCst);
        self.touched.lock().await.push(EntityRef::Plugin(id));
        debug!(type_name = %descriptor.type_name, %id, "plugin created");
        Ok(ItemStatus::Created(id))
    }

    async fn remove(&self, descriptor: &PluginDescriptor) -> Result<ItemStatus, PlugregError> {
        self.catalog.remove_plugin(descriptor.id).await?;
        self.removed.fetch_add(1, Ordering::SeqCst);
        debug!(type_name = %descriptor.type_name, id = %descriptor.id, "plugin removed");
        Ok(ItemStatus::Removed(descriptor.id))
    }

    /// Asks the decider once per colliding name; concurrent askers for the
    /// same name wait for the first answer.
    async fn decide(
        &self,
        collision: &NameCollision,
        decider: &dyn ConflictDecider,
    ) -> ConflictDecision {
        let slot = Arc::clone(
            &*self
                .decisions
                .entry(name_key(&collision.type_name))
                .or_default(),
        );
        let mut decision = slot.lock().await;
        if let Some(decided) = *decision {
            return decided;
        }
        let decided = decider.decide(collision).await;
        *decision = Some(decided);
        decided
    }

    async fn record(&self, type_name: String, operation: Operation, status: ItemStatus) {
        self.outcomes.lock().await.push(ItemOutcome {
            type_name,
            operation,
            status,
        });
    }
}
