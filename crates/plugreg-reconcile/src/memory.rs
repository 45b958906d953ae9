// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process plugin catalog with an optional JSON snapshot on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plugreg_core::{
    name_key, same_name, CollidingPlugin, EntityRef, ModuleRecord, PluginCatalog, PluginDescriptor, PlugregError,
    RemoteState,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stored<T> {
    record: T,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl<T> Stored<T> {
    fn new(record: T) -> Self {
        let now = Utc::now();
        Self {
            record,
            created_at: now,
            modified_at: now,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    modules: BTreeMap<Uuid, Stored<ModuleRecord>>,
    plugins: BTreeMap<Uuid, Stored<PluginDescriptor>>,
}

/// A [`PluginCatalog`] held in memory.
///
/// Created with [`MemoryCatalog::open`], it loads an existing snapshot and
/// [`MemoryCatalog::persist`] writes the current state back.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: RwLock<Snapshot>,
    path: Option<PathBuf>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the snapshot at `path`, starting empty when it does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PlugregError> {
        let path = path.into();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| PlugregError::Catalog {
                message: format!("corrupt catalog snapshot {}", path.display()),
                source: Some(Box::new(e)),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(source) => return Err(PlugregError::Io { path, source }),
        };
        debug!(path = %path.display(), modules = snapshot.modules.len(), "catalog opened");
        Ok(Self {
            state: RwLock::new(snapshot),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes the snapshot back to the file it was opened from. No-op for
    /// catalogs created with [`MemoryCatalog::new`].
    pub async fn persist(&self) -> Result<(), PlugregError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = {
            let state = self.state.read().await;
            serde_json::to_vec_pretty(&*state)
                .map_err(|e| PlugregError::Internal(format!("serialize catalog: {e}")))?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| PlugregError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|source| PlugregError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|source| PlugregError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "catalog persisted");
        Ok(())
    }

    /// Seeds a registration directly, keeping the given identities.
    pub async fn insert(&self, remote: RemoteState) {
        let mut state = self.state.write().await;
        let module_id = remote.module.id;
        state.modules.insert(module_id, Stored::new(remote.module));
        for mut plugin in remote.plugins {
            plugin.module_id = module_id;
            state.plugins.insert(plugin.id, Stored::new(plugin));
        }
    }

    /// Last modification time of a module or plugin.
    pub async fn modified_at(&self, entity: EntityRef) -> Option<DateTime<Utc>> {
        let state = self.state.read().await;
        match entity {
            EntityRef::Module(id) => state.modules.get(&id).map(|s| s.modified_at),
            EntityRef::Plugin(id) => state.plugins.get(&id).map(|s| s.modified_at),
        }
    }
}

fn not_found(what: &str, id: Uuid) -> PlugregError {
    PlugregError::catalog(format!("{what} {id} is not registered"))
}

#[async_trait]
impl PluginCatalog for MemoryCatalog {
    async fn fetch_catalog(&self, module_name: &str) -> Result<Option<RemoteState>, PlugregError> {
        let state = self.state.read().await;
        let Some(module) = state
            .modules
            .values()
            .find(|m| same_name(&m.record.name, module_name))
        else {
            return Ok(None);
        };

        let mut plugins: Vec<PluginDescriptor> = state
            .plugins
            .values()
            .filter(|p| p.record.module_id == module.record.id)
            .map(|p| p.record.clone())
            .collect();
        plugins.sort_by_key(|p| name_key(&p.type_name));

        Ok(Some(RemoteState {
            module: module.record.clone(),
            plugins,
        }))
    }

    async fn list_modules(&self) -> Result<Vec<ModuleRecord>, PlugregError> {
        let state = self.state.read().await;
        let mut modules: Vec<ModuleRecord> =
            state.modules.values().map(|m| m.record.clone()).collect();
        modules.sort_by_key(|m| name_key(&m.name));
        Ok(modules)
    }

    async fn create_module(&self, module: &ModuleRecord) -> Result<Uuid, PlugregError> {
        let mut state = self.state.write().await;
        if state
            .modules
            .values()
            .any(|m| same_name(&m.record.name, &module.name))
        {
            return Err(PlugregError::catalog(format!(
                "module `{}` is already registered",
                module.name
            )));
        }

        let id = Uuid::new_v4();
        let mut record = module.clone();
        record.id = id;
        state.modules.insert(id, Stored::new(record));
        Ok(id)
    }

    async fn update_module(&self, id: Uuid, module: &ModuleRecord) -> Result<(), PlugregError> {
        let mut state = self.state.write().await;
        let stored = state
            .modules
            .get_mut(&id)
            .ok_or_else(|| not_found("module", id))?;
        stored.record = ModuleRecord {
            id,
            ..module.clone()
        };
        stored.modified_at = Utc::now();
        Ok(())
    }

    async fn create_plugin(&self, plugin: &PluginDescriptor) -> Result<Uuid, PlugregError> {
        let mut state = self.state.write().await;
        if !state.modules.contains_key(&plugin.module_id) {
            return Err(not_found("module", plugin.module_id));
        }
        let duplicate = state
            .plugins
            .values()
            .any(|p| p.record.module_id == plugin.module_id && p.record.same_type(&plugin.type_name));
        if duplicate {
            return Err(PlugregError::catalog(format!(
                "type `{}` is already registered in this module",
                plugin.type_name
            )));
        }

        let id = Uuid::new_v4();
        let mut record = plugin.clone();
        record.id = id;
        state.plugins.insert(id, Stored::new(record));
        Ok(id)
    }

    async fn update_plugin(&self, id: Uuid, plugin: &PluginDescriptor) -> Result<(), PlugregError> {
        let mut state = self.state.write().await;
        let stored = state
            .plugins
            .get_mut(&id)
            .ok_or_else(|| not_found("plugin", id))?;
        stored.record = PluginDescriptor {
            id,
            ..plugin.clone()
        };
        stored.modified_at = Utc::now();
        Ok(())
    }

    async fn remove_plugin(&self, id: Uuid) -> Result<(), PlugregError> {
        let mut state = self.state.write().await;
        state
            .plugins
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("plugin", id))
    }

    async fn batch_touch_timestamps(&self, entities: &[EntityRef]) -> Result<(), PlugregError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut missing = Vec::new();
        for entity in entities {
            let modified = match entity {
                EntityRef::Module(id) => state.modules.get_mut(id).map(|s| &mut s.modified_at),
                EntityRef::Plugin(id) => state.plugins.get_mut(id).map(|s| &mut s.modified_at),
            };
            match modified {
                Some(modified_at) => *modified_at = now,
                None => missing.push(format!("{entity:?}")),
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PlugregError::catalog(format!(
                "cannot touch unknown entities: {}",
                missing.join(", ")
            )))
        }
    }

    async fn find_colliding_plugin(
        &self,
        type_name: &str,
        excluding_module: Uuid,
    ) -> Result<Option<CollidingPlugin>, PlugregError> {
        let state = self.state.read().await;
        Ok(state
            .plugins
            .values()
            .find(|p| p.record.module_id != excluding_module && p.record.same_type(type_name))
            .map(|p| CollidingPlugin {
                plugin_id: p.record.id,
                module_id: p.record.module_id,
                module_name: state
                    .modules
                    .get(&p.record.module_id)
                    .map(|m| m.record.name.clone())
                    .unwrap_or_default(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use plugreg_core::{Isolatable, ModuleVersion, PluginKind};

    use super::*;

    fn module(name: &str) -> ModuleRecord {
        ModuleRecord::new(name, ModuleVersion::new(1, 0, 0, 0))
    }

    fn plugin(module_id: Uuid, type_name: &str) -> PluginDescriptor {
        PluginDescriptor {
            id: Uuid::new_v4(),
            type_name: type_name.into(),
            display_name: type_name.into(),
            kind: PluginKind::Plugin,
            isolatable: Isolatable::Yes,
            workflow_group: None,
            module_id,
        }
    }

    #[tokio::test]
    async fn fetch_returns_none_for_unknown_module() {
        let catalog = MemoryCatalog::new();
        assert!(catalog.fetch_catalog("Contoso").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn created_entities_are_fetchable() {
        let catalog = MemoryCatalog::new();
        let module_id = catalog.create_module(&module("Contoso")).await.unwrap();
        catalog.create_plugin(&plugin(module_id, "Contoso.B")).await.unwrap();
        catalog.create_plugin(&plugin(module_id, "Contoso.A")).await.unwrap();

        let remote = catalog.fetch_catalog("contoso").await.unwrap().unwrap();
        assert_eq!(remote.module.id, module_id);
        let names: Vec<_> = remote.plugins.iter().map(|p| p.type_name.as_str()).collect();
        assert_eq!(names, ["Contoso.A", "Contoso.B"]);
    }

    #[tokio::test]
    async fn duplicate_module_and_type_names_are_rejected() {
        let catalog = MemoryCatalog::new();
        let module_id = catalog.create_module(&module("Contoso")).await.unwrap();
        assert!(catalog.create_module(&module("CONTOSO")).await.is_err());

        catalog.create_plugin(&plugin(module_id, "Contoso.A")).await.unwrap();
        assert!(catalog.create_plugin(&plugin(module_id, "contoso.a")).await.is_err());
        assert!(catalog.create_plugin(&plugin(Uuid::new_v4(), "Contoso.Z")).await.is_err());
    }

    #[tokio::test]
    async fn collisions_ignore_the_excluded_module() {
        let catalog = MemoryCatalog::new();
        let first = catalog.create_module(&module("First")).await.unwrap();
        let second = catalog.create_module(&module("Second")).await.unwrap();
        let id = catalog.create_plugin(&plugin(first, "Shared.Type")).await.unwrap();

        assert!(catalog
            .find_colliding_plugin("shared.type", first)
            .await
            .unwrap()
            .is_none());
        let hit = catalog
            .find_colliding_plugin("Shared.Type", second)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.plugin_id, id);
        assert_eq!(hit.module_name, "First");
    }

    #[tokio::test]
    async fn touching_unknown_entity_fails_but_touches_the_rest() {
        let catalog = MemoryCatalog::new();
        let module_id = catalog.create_module(&module("Contoso")).await.unwrap();
        let before = catalog.modified_at(EntityRef::Module(module_id)).await.unwrap();

        let err = catalog
            .batch_touch_timestamps(&[EntityRef::Module(module_id), EntityRef::Plugin(Uuid::nil())])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown entities"));
        assert!(catalog.modified_at(EntityRef::Module(module_id)).await.unwrap() >= before);
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("catalog.json");

        let catalog = MemoryCatalog::open(&path).await.unwrap();
        let module_id = catalog.create_module(&module("Contoso")).await.unwrap();
        catalog.create_plugin(&plugin(module_id, "Contoso.A")).await.unwrap();
        catalog.persist().await.unwrap();

        let reopened = MemoryCatalog::open(&path).await.unwrap();
        let remote = reopened.fetch_catalog("Contoso").await.unwrap().unwrap();
        assert_eq!(remote.module.id, module_id);
        assert_eq!(remote.plugins.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_a_catalog_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = MemoryCatalog::open(&path).await.unwrap_err();
        assert!(matches!(err, PlugregError::Catalog { .. }));
    }
}
