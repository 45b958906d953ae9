// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin registration reconciliation.
//!
//! Given the descriptors discovered in a module and the ones already
//! registered in a catalog, [`build_plan`] computes a validated diff and
//! [`ReconciliationEngine`] applies it. [`Reconciler`] runs the whole
//! probe-to-report sequence for one file and [`update_all`] repeats it for
//! every registered module.

pub mod engine;
pub mod memory;
pub mod plan;
pub mod reconciler;
pub mod report;
pub mod update_all;

pub use engine::ReconciliationEngine;
pub use memory::MemoryCatalog;
pub use plan::{
    build_plan, GroupRename, ModuleAction, Plan, PlanSummary, RegisterAction, RegisterEntry,
    Selection,
};
pub use reconciler::{Reconciler, SyncOutcome};
pub use report::{ExecutionReport, ItemError, ItemOutcome, ItemStatus, Operation};
pub use update_all::{update_all, BatchReport, ModuleUpdate, SkipReason, UpdateAllOptions};
