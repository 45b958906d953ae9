// SPDX-FileCopyrightText: 2026 Plugreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote catalog trait: the registered side of every reconciliation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::PlugregError;
use crate::types::{CollidingPlugin, EntityRef, ModuleRecord, PluginDescriptor, RemoteState};

/// Management catalog holding registered modules and their descriptors.
///
/// Implementations own transport, authentication and timeouts. The
/// reconciliation engine only observes success or failure per call.
#[async_trait]
pub trait PluginCatalog: Send + Sync {
    /// Reads the current registration of the named module, if any.
    async fn fetch_catalog(&self, module_name: &str) -> Result<Option<RemoteState>, PlugregError>;

    /// Lists every registered module.
    async fn list_modules(&self) -> Result<Vec<ModuleRecord>, PlugregError>;

    /// Registers a new module and returns the identity the catalog assigned.
    async fn create_module(&self, module: &ModuleRecord) -> Result<Uuid, PlugregError>;

    /// Replaces the stored module record (binary, version, isolation) in place.
    async fn update_module(&self, id: Uuid, module: &ModuleRecord) -> Result<(), PlugregError>;

    /// Registers a new descriptor and returns its identity.
    async fn create_plugin(&self, plugin: &PluginDescriptor) -> Result<Uuid, PlugregError>;

    /// Updates an existing descriptor in place.
    async fn update_plugin(&self, id: Uuid, plugin: &PluginDescriptor) -> Result<(), PlugregError>;

    /// Unregisters a descriptor.
    async fn remove_plugin(&self, id: Uuid) -> Result<(), PlugregError>;

    /// Refreshes created/modified metadata for the given entities.
    async fn batch_touch_timestamps(&self, entities: &[EntityRef]) -> Result<(), PlugregError>;

    /// Looks for a descriptor with the same type name registered under any
    /// module other than `excluding_module`.
    async fn find_colliding_plugin(
        &self,
        type_name: &str,
        excluding_module: Uuid,
    ) -> Result<Option<CollidingPlugin>, PlugregError>;
}
