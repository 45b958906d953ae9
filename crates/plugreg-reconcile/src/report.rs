// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution outcome of a plan.

use std::fmt;

use plugreg_core::same_name;
use serde::Serialize;
use strum::Display;
use uuid::Uuid;

/// Catalog operation attempted for a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "id", rename_all = "lowercase")]
pub enum ItemStatus {
    Created(Uuid),
    Updated(Uuid),
    Removed(Uuid),
    /// A colliding registration was kept instead of creating a new one.
    Reused(Uuid),
    Failed,
    /// Not dispatched because the run was aborted.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub type_name: String,
    pub operation: Operation,
    #[serde(flatten)]
    pub status: ItemStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub type_name: String,
    pub operation: Operation,
    pub message: String,
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.operation, self.type_name, self.message)
    }
}

/// What a plan execution did. Item lists are sorted by type name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub module_id: Option<Uuid>,
    pub module_created: bool,
    pub module_updated: bool,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub removed: usize,
    pub errored: usize,
    pub items: Vec<ItemOutcome>,
    pub errors: Vec<ItemError>,
    /// Set when a conflict decision aborted dispatch.
    pub cancelled: bool,
    /// Failure refreshing entity timestamps after the run.
    pub timestamp_error: Option<String>,
}

impl ExecutionReport {
    /// True when every item was applied and nothing was cancelled.
    pub fn is_clean(&self) -> bool {
        self.errored == 0 && !self.cancelled && self.timestamp_error.is_none()
    }

    pub fn outcome(&self, type_name: &str) -> Option<&ItemOutcome> {
        self.items
            .iter()
            .find(|item| same_name(&item.type_name, type_name))
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped, {} removed, {} errored",
            self.created, self.updated, self.skipped, self.removed, self.errored
        )?;
        if self.cancelled {
            write!(f, " (aborted)")?;
        }
        Ok(())
    }
}
