//! Keyed container of live plugins.

use crate::error::RegistryError;
use parking_lot::RwLock;
use pion_types::PluginId;
use std::collections::HashMap;
use std::sync::Arc;

/// Map from plugin id to an owning shared handle.
///
/// Lookups clone the `Arc`, so removal never invalidates a handle a
/// worker already holds; the registry merely drops its own reference
/// and the plugin is destroyed when the last holder releases. The lock
/// is held only for map access, never across plugin calls.
pub struct PluginRegistry<B: ?Sized> {
    plugins: RwLock<HashMap<PluginId, Arc<B>>>,
}

impl<B: ?Sized> PluginRegistry<B> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a plugin, generating an id when none is supplied.
    ///
    /// # Errors
    ///
    /// `REGISTRY_DUPLICATE_ID` when the id is already taken.
    pub fn add(&self, id: Option<PluginId>, plugin: Arc<B>) -> Result<PluginId, RegistryError> {
        let id = id.unwrap_or_else(PluginId::generate);
        let mut plugins = self.plugins.write();
        if plugins.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        plugins.insert(id.clone(), plugin);
        Ok(id)
    }

    /// Removes a plugin, returning the dropped owning handle.
    ///
    /// # Errors
    ///
    /// `REGISTRY_NOT_FOUND` when the id is unknown.
    pub fn remove(&self, id: &PluginId) -> Result<Arc<B>, RegistryError> {
        self.plugins
            .write()
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Returns a shared handle to a plugin.
    #[must_use]
    pub fn get(&self, id: &PluginId) -> Option<Arc<B>> {
        self.plugins.read().get(id).cloned()
    }

    /// Returns whether an id is registered.
    #[must_use]
    pub fn contains(&self, id: &PluginId) -> bool {
        self.plugins.read().contains_key(id)
    }

    /// Snapshot of the registered ids.
    #[must_use]
    pub fn ids(&self) -> Vec<PluginId> {
        self.plugins.read().keys().cloned().collect()
    }

    /// Number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }

    /// Applies a closure to every plugin.
    ///
    /// Runs on cloned handles so the lock is not held across the calls.
    pub fn for_each(&self, mut f: impl FnMut(&PluginId, &Arc<B>)) {
        let snapshot: Vec<(PluginId, Arc<B>)> = {
            let plugins = self.plugins.read();
            plugins
                .iter()
                .map(|(id, plugin)| (id.clone(), plugin.clone()))
                .collect()
        };
        for (id, plugin) in &snapshot {
            f(id, plugin);
        }
    }

    /// Sums an unsigned statistic over every plugin.
    pub fn aggregate(&self, f: impl Fn(&B) -> u64) -> u64 {
        let mut total = 0u64;
        self.for_each(|_, plugin| total += f(plugin));
        total
    }
}

impl<B: ?Sized> Default for PluginRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}
