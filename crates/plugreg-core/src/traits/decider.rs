// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conflict-decision callback supplied by the presentation layer.

use async_trait::async_trait;

use crate::types::{ConflictDecision, NameCollision};

/// Answers name collisions against descriptors owned by other modules.
///
/// This is the only point where reconciliation may wait on a user.
#[async_trait]
pub trait ConflictDecider: Send + Sync {
    async fn decide(&self, collision: &NameCollision) -> ConflictDecision;
}

/// Answers every collision the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub ConflictDecision);

#[async_trait]
impl ConflictDecider for FixedDecision {
    async fn decide(&self, _collision: &NameCollision) -> ConflictDecision {
        self.0
    }
}
