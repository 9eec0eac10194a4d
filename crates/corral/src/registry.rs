//! Named spec registry.
//!
//! Concurrent map from loader names to shared [`LoaderSpec`]s, so request
//! handlers can resolve a spec by name and spawn builders without holding
//! any lock across the build.

use crate::spec::LoaderSpec;
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe registry of named loader specs.
pub struct SpecRegistry<Q> {
    specs: DashMap<String, Arc<LoaderSpec<Q>>>,
}

impl<Q> SpecRegistry<Q> {
    pub fn new() -> Self {
        Self {
            specs: DashMap::new(),
        }
    }

    /// Register a spec under a name, replacing any previous entry.
    pub fn register(&self, name: &str, spec: Arc<LoaderSpec<Q>>) {
        tracing::debug!(loader = %name, "registering loader spec");
        self.specs.insert(name.to_string(), spec);
    }

    /// Look up a spec by name.
    pub fn get(&self, name: &str) -> Option<Arc<LoaderSpec<Q>>> {
        self.specs.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a spec, returning it if it was registered.
    pub fn remove(&self, name: &str) -> Option<Arc<LoaderSpec<Q>>> {
        self.specs.remove(name).map(|entry| entry.1)
    }

    /// Names of all registered specs.
    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl<Q> Default for SpecRegistry<Q> {
    fn default() -> Self {
        Self::new()
    }
}
