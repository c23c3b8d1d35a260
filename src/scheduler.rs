//! The probe scheduler loop and the per-run dispatch unit.
//!
//! A single scheduler task enumerates the registry, fires every probe whose
//! next-run time has elapsed, then waits for either a wake signal from the
//! reconciler or the tick ceiling, whichever comes first. The wake signal is
//! a hint that accelerates convergence; correctness never depends on it
//! being delivered.
//!
//! Dispatched runs are not awaited. Re-entry of the same key is kept
//! improbable by advancing the entry's next-run time before any network I/O
//! happens (start-to-start scheduling), so a slow probe neither drifts the
//! schedule nor re-fires until its interval elapses.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use tokio::sync::Notify;

use crate::config::EngineConfig;
use crate::metrics;
use crate::probe;
use crate::registry::Registry;
use crate::resource::ResourceKey;
use crate::status;
use crate::store::Store;

pub struct Scheduler<S: Store> {
    store: Arc<S>,
    registry: Arc<Registry>,
    wake: Arc<Notify>,
    config: EngineConfig,
}

impl<S: Store + 'static> Scheduler<S> {
    pub fn new(
        store: Arc<S>,
        registry: Arc<Registry>,
        wake: Arc<Notify>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            registry,
            wake,
            config,
        }
    }

    /// Run the scheduler loop. Never returns; abort the task to stop it.
    pub async fn run(self: Arc<Self>) {
        tracing::info!(tick = ?self.config.tick_interval, "Scheduler starting");
        loop {
            let now = Utc::now();

            let mut due = Vec::new();
            self.registry.range(|key, entry| {
                if entry.next_run <= now {
                    due.push(key.clone());
                }
            });

            for key in due {
                let scheduler = self.clone();
                tokio::spawn(async move {
                    scheduler.probe_run(&key).await;
                });
            }

            tokio::select! {
                _ = self.wake.notified() => {
                    tracing::debug!("Scheduler woken early");
                }
                _ = tokio::time::sleep(self.config.tick_interval) => {}
            }
        }
    }

    /// Execute one probe run for a key: refetch the definition, advance the
    /// schedule, probe, publish the gauge, and write status unless the
    /// definition changed underneath us.
    async fn probe_run(&self, key: &ResourceKey) {
        let test = match self.store.get(key).await {
            Ok(Some(test)) => test,
            Ok(None) => {
                // The reconciler prunes the registry entry on its own.
                tracing::debug!(key = %key, "Definition gone before probe run");
                return;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to fetch definition for probe run");
                return;
            }
        };

        let rv_before = test.metadata.resource_version.clone();

        tracing::debug!(
            namespace = %test.metadata.namespace,
            name = %test.metadata.name,
            generation = test.metadata.generation,
            "Probing"
        );

        // Advance the schedule before any network I/O so the interval is
        // measured start to start and a slow probe cannot re-enter.
        let interval =
            TimeDelta::from_std(test.spec.interval()).unwrap_or_else(|_| TimeDelta::hours(1));
        let next_run = Utc::now() + interval;
        self.registry.update(key, |entry| entry.next_run = next_run);

        let outcome = match probe::run(&test.spec).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::info!(key = %key, error = %e, "Unschedulable probe definition");
                return;
            }
        };

        metrics::record_probe_result(
            &test.metadata.namespace,
            &test.metadata.name,
            &test.spec.address(),
            outcome.success,
        );

        // Refetch and fence on the resource version: if the definition
        // moved while we were probing, the observation belongs to a spec
        // that no longer exists and the next reconcile settles things.
        let current = match self.store.get(key).await {
            Ok(Some(current)) => current,
            Ok(None) => {
                tracing::debug!(key = %key, "Definition deleted during probe run");
                return;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to refetch definition, dropping result");
                return;
            }
        };
        if current.metadata.resource_version != rv_before {
            tracing::info!(
                namespace = %current.metadata.namespace,
                name = %current.metadata.name,
                "Definition changed during probing, skipping status write"
            );
            return;
        }

        if let Err(e) = status::write_outcome(self.store.as_ref(), current, &outcome, next_run).await
        {
            // The next probe cycle retries; conflicts also resolve through
            // the reconcile triggered by whatever mutation won the race.
            tracing::info!(key = %key, error = %e, "Could not update status");
        }
    }
}
