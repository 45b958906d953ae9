// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the probe and the reconciliation engine.
//!
//! Remote-facing traits use `#[async_trait]` for dynamic dispatch
//! compatibility.

pub mod catalog;
pub mod decider;
pub mod source;

pub use catalog::PluginCatalog;
pub use decider::{ConflictDecider, FixedDecision};
pub use source::{DiskSource, ModuleSource};
