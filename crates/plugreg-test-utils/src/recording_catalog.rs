// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog decorator that counts calls and injects failures.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use plugreg_core::{
    name_key, CollidingPlugin, EntityRef, ModuleRecord, PluginCatalog, PluginDescriptor, PlugregError,
    RemoteState,
};

/// Catalog methods, for counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogCall {
    FetchCatalog,
    ListModules,
    CreateModule,
    UpdateModule,
    CreatePlugin,
    UpdatePlugin,
    RemovePlugin,
    TouchTimestamps,
    FindColliding,
}

impl CatalogCall {
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::CreateModule
                | Self::UpdateModule
                | Self::CreatePlugin
                | Self::UpdatePlugin
                | Self::RemovePlugin
        )
    }
}

#[derive(Debug, Clone)]
struct Failure {
    call: CatalogCall,
    /// Only fail for this type name; `None` fails every call.
    type_name: Option<String>,
}

/// Wraps a real catalog, recording every call before forwarding it.
pub struct RecordingCatalog {
    inner: Arc<dyn PluginCatalog>,
    calls: Mutex<HashMap<CatalogCall, usize>>,
    log: Mutex<Vec<(CatalogCall, String)>>,
    failures: Mutex<Vec<Failure>>,
    /// Plugin ids mapped to type names, so removals and updates can be targeted.
    names: Mutex<HashMap<Uuid, String>>,
}

impl RecordingCatalog {
    pub fn new(inner: Arc<dyn PluginCatalog>) -> Self {
        Self {
            inner,
            calls: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            names: Mutex::new(HashMap::new()),
        }
    }

    /// Makes every `call` fail.
    pub async fn fail(&self, call: CatalogCall) {
        self.failures.lock().await.push(Failure {
            call,
            type_name: None,
        });
    }

    /// Makes `call` fail for one type name (case-insensitive).
    pub async fn fail_for(&self, call: CatalogCall, type_name: &str) {
        self.failures.lock().await.push(Failure {
            call,
            type_name: Some(name_key(type_name)),
        });
    }

    pub async fn count(&self, call: CatalogCall) -> usize {
        self.calls.lock().await.get(&call).copied().unwrap_or(0)
    }

    pub async fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(call, _)| call.is_mutation())
            .map(|(_, count)| count)
            .sum()
    }

    /// Calls in the order they arrived, with the type or module name involved.
    pub async fn log(&self) -> Vec<(CatalogCall, String)> {
        self.log.lock().await.clone()
    }

    async fn record(&self, call: CatalogCall, subject: &str) -> Result<(), PlugregError> {
        *self.calls.lock().await.entry(call).or_insert(0) += 1;
        self.log.lock().await.push((call, subject.to_string()));

        let subject = name_key(subject);
        let failing = self.failures.lock().await.iter().any(|f| {
            f.call == call && f.type_name.as_ref().is_none_or(|name| *name == subject)
        });
        if failing {
            Err(PlugregError::catalog(format!("injected {call:?} failure for {subject}")))
        } else {
            Ok(())
        }
    }

    async fn name_of(&self, id: Uuid) -> String {
        self.names
            .lock()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

#[async_trait]
impl PluginCatalog for RecordingCatalog {
    async fn fetch_catalog(&self, module_name: &str) -> Result<Option<RemoteState>, PlugregError> {
        self.record(CatalogCall::FetchCatalog, module_name).await?;
        let remote = self.inner.fetch_catalog(module_name).await?;
        if let Some(remote) = &remote {
            let mut names = self.names.lock().await;
            for plugin in &remote.plugins {
                names.insert(plugin.id, plugin.type_name.clone());
            }
        }
        Ok(remote)
    }

    async fn list_modules(&self) -> Result<Vec<ModuleRecord>, PlugregError> {
        self.record(CatalogCall::ListModules, "").await?;
        self.inner.list_modules().await
    }

    async fn create_module(&self, module: &ModuleRecord) -> Result<Uuid, PlugregError> {
        self.record(CatalogCall::CreateModule, &module.name).await?;
        self.inner.create_module(module).await
    }

    async fn update_module(&self, id: Uuid, module: &ModuleRecord) -> Result<(), PlugregError> {
        self.record(CatalogCall::UpdateModule, &module.name).await?;
        self.inner.update_module(id, module).await
    }

    async fn create_plugin(&self, plugin: &PluginDescriptor) -> Result<Uuid, PlugregError> {
        self.record(CatalogCall::CreatePlugin, &plugin.type_name).await?;
        let id = self.inner.create_plugin(plugin).await?;
        self.names.lock().await.insert(id, plugin.type_name.clone());
        Ok(id)
    }

    async fn update_plugin(&self, id: Uuid, plugin: &PluginDescriptor) -> Result<(), PlugregError> {
        self.record(CatalogCall::UpdatePlugin, &plugin.type_name).await?;
        self.inner.update_plugin(id, plugin).await
    }

    async fn remove_plugin(&self, id: Uuid) -> Result<(), PlugregError> {
        let name = self.name_of(id).await;
        self.record(CatalogCall::RemovePlugin, &name).await?;
        self.inner.remove_plugin(id).await
    }

    async fn batch_touch_timestamps(&self, entities: &[EntityRef]) -> Result<(), PlugregError> {
        self.record(CatalogCall::TouchTimestamps, "").await?;
        self.inner.batch_touch_timestamps(entities).await
    }

    async fn find_colliding_plugin(
        &self,
        type_name: &str,
        excluding_module: Uuid,
    ) -> Result<Option<CollidingPlugin>, PlugregError> {
        self.record(CatalogCall::FindColliding, type_name).await?;
        self.inner
            .find_colliding_plugin(type_name, excluding_module)
            .await
    }
}
