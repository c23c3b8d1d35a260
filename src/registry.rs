//! In-memory registry of admitted probes and their scheduling metadata.
//!
//! The registry is the single piece of shared mutable state between the
//! reconciler (which admits, replaces and evicts entries) and the scheduler
//! (which reads next-fire times and advances them). Access is serialized
//! per key; there is no ordering guarantee across entries.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::resource::ResourceKey;

/// Scheduling record for one admitted probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Wall-clock time of the next fire.
    pub next_run: DateTime<Utc>,
    /// Spec generation that was current when the entry was last admitted.
    /// A mismatch with the store tells the reconciler to replace the entry.
    pub generation: i64,
}

/// Concurrent map from probe key to [`RegistryEntry`].
#[derive(Debug, Default)]
pub struct Registry {
    entries: DashMap<ResourceKey, RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry, cloning it out.
    pub fn load(&self, key: &ResourceKey) -> Option<RegistryEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Insert or overwrite an entry.
    pub fn store(&self, key: ResourceKey, entry: RegistryEntry) {
        self.entries.insert(key, entry);
    }

    /// Atomically transform an existing entry. Returns false when the key
    /// is absent (e.g. evicted concurrently), in which case nothing happens.
    pub fn update(&self, key: &ResourceKey, mutate: impl FnOnce(&mut RegistryEntry)) -> bool {
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                mutate(&mut entry);
                true
            }
            None => false,
        }
    }

    /// Remove an entry. Returns whether it was present.
    pub fn delete(&self, key: &ResourceKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Visit every entry. The visitor sees a consistent view of each entry
    /// but not a global snapshot; entries added or removed mid-iteration
    /// may or may not be visited.
    pub fn range(&self, mut visit: impl FnMut(&ResourceKey, &RegistryEntry)) {
        for entry in self.entries.iter() {
            visit(entry.key(), entry.value());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.entries.contains_key(key)
    }
}
