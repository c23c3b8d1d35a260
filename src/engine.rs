//! Assembles the engine: one registry, one wake signal, a reconciler and a
//! scheduler sharing them.

use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::reconciler::Reconciler;
use crate::registry::Registry;
use crate::scheduler::Scheduler;
use crate::store::{Store, WatchEvent};

/// Handle to a wired probe engine.
///
/// The embedding process constructs one of these around its store client,
/// then calls [`Engine::start`] with the store's watch stream. Both spawned
/// tasks run until aborted; the engine has no shutdown protocol of its own
/// beyond the host process lifecycle.
pub struct Engine<S: Store> {
    store: Arc<S>,
    registry: Arc<Registry>,
    wake: Arc<Notify>,
    config: EngineConfig,
}

impl<S: Store + 'static> Engine<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            store,
            registry: Arc::new(Registry::new()),
            wake: Arc::new(Notify::new()),
            config,
        }
    }

    /// The shared scheduling registry, mainly useful for inspection.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Build the reconciler sharing this engine's registry and wake signal.
    pub fn reconciler(&self) -> Reconciler<S> {
        Reconciler::new(self.store.clone(), self.registry.clone(), self.wake.clone())
    }

    /// Build the scheduler sharing this engine's registry and wake signal.
    pub fn scheduler(&self) -> Scheduler<S> {
        Scheduler::new(
            self.store.clone(),
            self.registry.clone(),
            self.wake.clone(),
            self.config.clone(),
        )
    }

    /// Spawn the reconciler (fed from `events`) and the scheduler. Returns
    /// the task handles; abort them to stop the engine.
    pub fn start(&self, events: mpsc::UnboundedReceiver<WatchEvent>) -> (JoinHandle<()>, JoinHandle<()>) {
        let reconciler = Arc::new(self.reconciler());
        let scheduler = Arc::new(self.scheduler());
        (
            tokio::spawn(reconciler.run(events)),
            tokio::spawn(scheduler.run()),
        )
    }
}
