//! Seam between the engine and the declarative store.
//!
//! The engine only ever needs two things from the store: reading a
//! `NetworkTest` by key, and writing its status subresource back under
//! optimistic concurrency. Everything else (watch delivery, re-delivery of
//! failed reconciles, credentials) is owned by the embedding process, which
//! plugs its client in through the [`Store`] trait.
//!
//! [`MemoryStore`] is a complete in-process implementation with the same
//! bookkeeping a real store performs: `generation` advances on spec
//! mutations, `resourceVersion` on every mutation, and stale status writes
//! are rejected. It backs the test suite and is useful to embedders for
//! wiring the engine without a cluster.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::error::{EngineError, Result};
use crate::resource::{NetworkTest, NetworkTestSpec, ResourceKey};

/// A change notification from the store's watch stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Added(ResourceKey),
    Modified(ResourceKey),
    Deleted(ResourceKey),
}

impl WatchEvent {
    /// The key of the resource the event concerns.
    pub fn key(&self) -> &ResourceKey {
        match self {
            WatchEvent::Added(key) | WatchEvent::Modified(key) | WatchEvent::Deleted(key) => key,
        }
    }
}

/// Read and status-write access to the declarative store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch a resource by key. `Ok(None)` means the resource does not
    /// exist; errors are transient store failures.
    async fn get(&self, key: &ResourceKey) -> Result<Option<NetworkTest>>;

    /// Submit the status subresource of `test`. The write is rejected with
    /// [`EngineError::Conflict`] if `test.metadata.resource_version` is
    /// stale. On success the returned object carries the advanced resource
    /// version. A write that does not change the status is a no-op and
    /// leaves the resource version untouched.
    async fn update_status(&self, test: &NetworkTest) -> Result<NetworkTest>;
}

/// In-memory [`Store`] with watch delivery and fault injection.
#[derive(Default)]
pub struct MemoryStore {
    objects: DashMap<ResourceKey, NetworkTest>,
    revision: AtomicU64,
    watchers: Mutex<Vec<mpsc::UnboundedSender<WatchEvent>>>,
    fail_gets: AtomicU64,
    fail_status_updates: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to change notifications. Events are delivered for every
    /// create, spec update, status update and delete.
    pub fn watch(&self) -> mpsc::UnboundedReceiver<WatchEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers.lock().expect("watchers lock poisoned").push(tx);
        rx
    }

    fn emit(&self, event: WatchEvent) {
        let mut watchers = self.watchers.lock().expect("watchers lock poisoned");
        watchers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn next_revision(&self) -> String {
        (self.revision.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    /// Create a resource from a spec. Generation starts at 1.
    pub fn create(&self, key: ResourceKey, spec: NetworkTestSpec) -> NetworkTest {
        let test = NetworkTest {
            metadata: crate::resource::ObjectMeta {
                namespace: key.namespace.clone(),
                name: key.name.clone(),
                generation: 1,
                resource_version: self.next_revision(),
            },
            spec,
            status: Default::default(),
        };
        self.objects.insert(key.clone(), test.clone());
        self.emit(WatchEvent::Added(key));
        test
    }

    /// Mutate the spec of an existing resource, advancing both generation
    /// and resource version.
    pub fn update_spec(
        &self,
        key: &ResourceKey,
        mutate: impl FnOnce(&mut NetworkTestSpec),
    ) -> Result<NetworkTest> {
        let updated = {
            let mut entry = self.objects.get_mut(key).ok_or_else(|| {
                EngineError::TransientStore(format!("no such resource: {key}"))
            })?;
            mutate(&mut entry.spec);
            entry.metadata.generation += 1;
            entry.metadata.resource_version = self.next_revision();
            entry.clone()
        };
        self.emit(WatchEvent::Modified(key.clone()));
        Ok(updated)
    }

    /// Remove a resource.
    pub fn delete(&self, key: &ResourceKey) {
        if self.objects.remove(key).is_some() {
            self.emit(WatchEvent::Deleted(key.clone()));
        }
    }

    /// Make the next `n` `get` calls fail with a transient store error.
    pub fn fail_next_gets(&self, n: u64) {
        self.fail_gets.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` status updates fail with a transient store error.
    pub fn fail_next_status_updates(&self, n: u64) {
        self.fail_status_updates.store(n, Ordering::SeqCst);
    }

    fn consume_fault(counter: &AtomicU64) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &ResourceKey) -> Result<Option<NetworkTest>> {
        if Self::consume_fault(&self.fail_gets) {
            return Err(EngineError::TransientStore("injected get failure".to_string()));
        }
        Ok(self.objects.get(key).map(|entry| entry.value().clone()))
    }

    async fn update_status(&self, test: &NetworkTest) -> Result<NetworkTest> {
        if Self::consume_fault(&self.fail_status_updates) {
            return Err(EngineError::TransientStore(
                "injected status update failure".to_string(),
            ));
        }

        let key = test.key();
        let updated = {
            let mut entry = self.objects.get_mut(&key).ok_or_else(|| {
                EngineError::TransientStore(format!("no such resource: {key}"))
            })?;
            if entry.metadata.resource_version != test.metadata.resource_version {
                return Err(EngineError::Conflict { key: key.clone() });
            }
            if entry.status == test.status {
                // No change; the store does not advance the resource version.
                return Ok(entry.clone());
            }
            entry.status = test.status.clone();
            entry.metadata.resource_version = self.next_revision();
            entry.clone()
        };
        self.emit(WatchEvent::Modified(key));
        Ok(updated)
    }
}
