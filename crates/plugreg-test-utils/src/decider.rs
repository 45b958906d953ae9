// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conflict decider answering from a script.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use plugreg_core::{name_key, ConflictDecider, ConflictDecision, NameCollision};

/// Answers per type name, falling back to a default, and records every question.
pub struct ScriptedDecider {
    answers: HashMap<String, ConflictDecision>,
    default: ConflictDecision,
    asked: Mutex<Vec<String>>,
}

impl ScriptedDecider {
    pub fn new(default: ConflictDecision) -> Self {
        Self {
            answers: HashMap::new(),
            default,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn answer(mut self, type_name: &str, decision: ConflictDecision) -> Self {
        self.answers.insert(name_key(type_name), decision);
        self
    }

    /// Type names the decider was asked about, in order.
    pub async fn asked(&self) -> Vec<String> {
        self.asked.lock().await.clone()
    }
}

#[async_trait]
impl ConflictDecider for ScriptedDecider {
    async fn decide(&self, collision: &NameCollision) -> ConflictDecision {
        self.asked.lock().await.push(collision.type_name.clone());
        self.answers
            .get(&name_key(&collision.type_name))
            .copied()
            .unwrap_or(self.default)
    }
}
