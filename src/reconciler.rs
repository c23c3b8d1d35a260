//! Brings engine state into agreement with the declared resources.
//!
//! The reconciler is invoked with a key whenever the store reports a
//! `NetworkTest` as created, updated or deleted. It validates the spec,
//! writes admission status back, and keeps the scheduling registry in step,
//! waking the scheduler whenever the registry is disturbed. Reconciliation
//! is idempotent: replaying it against an unchanged definition produces no
//! observable change. Errors are returned, not retried; the watch framework
//! re-delivers failed reconciles.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, Notify};

use crate::error::Result;
use crate::registry::{Registry, RegistryEntry};
use crate::resource::ResourceKey;
use crate::store::{Store, WatchEvent};
use crate::validate::{validate, Admission};

pub struct Reconciler<S: Store> {
    store: Arc<S>,
    registry: Arc<Registry>,
    wake: Arc<Notify>,
}

impl<S: Store + 'static> Reconciler<S> {
    pub fn new(store: Arc<S>, registry: Arc<Registry>, wake: Arc<Notify>) -> Self {
        Self {
            store,
            registry,
            wake,
        }
    }

    /// Reconcile one resource by key.
    #[tracing::instrument(skip(self), fields(key = %key))]
    pub async fn reconcile(&self, key: &ResourceKey) -> Result<()> {
        let Some(mut test) = self.store.get(key).await? else {
            if self.registry.delete(key) {
                tracing::debug!("Removed probe for deleted definition");
            }
            return Ok(());
        };

        if !test.spec.enabled && test.status.active {
            // Disabling clears the whole observation, not just the flag.
            test.status.active = false;
            test.status.conditions = Vec::new();
            test.status.last_run = None;
            test.status.next_run = None;
            test.status.last_result = None;
            test.status.message = Some("Disabled".to_string());
        } else if test.spec.enabled && !test.status.active {
            match validate(&test.spec) {
                Admission::Admitted => {
                    test.status.active = true;
                    test.status.message = Some(String::new());
                }
                Admission::Rejected(reason) => {
                    tracing::info!(reason = %reason, "Rejected probe definition");
                    test.status.active = false;
                    test.status.message = Some(reason);
                }
                // Unreachable with enabled=true; kept for exhaustiveness.
                Admission::Disabled => {}
            }
        }

        let test = self.store.update_status(&test).await?;

        if test.status.active {
            match self.registry.load(key) {
                None => {
                    self.registry.store(
                        key.clone(),
                        RegistryEntry {
                            next_run: Utc::now(),
                            generation: test.metadata.generation,
                        },
                    );
                    tracing::debug!("Added probe");
                    self.wake.notify_one();
                }
                Some(entry) if entry.generation != test.metadata.generation => {
                    // New parameters take effect immediately.
                    self.registry.store(
                        key.clone(),
                        RegistryEntry {
                            next_run: Utc::now(),
                            generation: test.metadata.generation,
                        },
                    );
                    tracing::debug!(generation = test.metadata.generation, "Updated probe");
                    self.wake.notify_one();
                }
                Some(_) => {}
            }
        } else if self.registry.delete(key) {
            tracing::debug!("Deactivated probe");
        }

        Ok(())
    }

    /// Drain a watch stream, reconciling each delivered key. Errors are
    /// logged and dropped here; re-delivery is the watch framework's job.
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<WatchEvent>) {
        tracing::info!("Reconciler consuming watch events");
        while let Some(event) = events.recv().await {
            let key = event.key().clone();
            if let Err(e) = self.reconcile(&key).await {
                if e.is_transient() {
                    tracing::info!(key = %key, error = %e, "Reconcile failed, awaiting re-delivery");
                } else {
                    tracing::warn!(key = %key, error = %e, "Reconcile failed, awaiting re-delivery");
                }
            }
        }
        tracing::info!("Watch stream closed, reconciler stopping");
    }
}
