//! # networktester: a cluster-native network probe engine
//!
//! `networktester` continuously executes reachability tests that operators
//! declare as managed resources. A test is either an HTTP(S) GET or a raw
//! TCP connect with an optional payload, run on a per-test interval; the
//! observed result is written back to the resource's status and exposed as
//! a gauge for scrape.
//!
//! ## Architecture
//!
//! The declarative store delivers change notifications for `NetworkTest`
//! resources. The [`reconciler`](crate::reconciler::Reconciler) validates
//! each changed definition, records admission in the status subresource,
//! and keeps the shared [`registry`](crate::registry::Registry) of
//! schedulable probes in step — waking the
//! [`scheduler`](crate::scheduler::Scheduler) whenever the registry is
//! disturbed. The scheduler enumerates the registry on every wake or tick
//! and dispatches a probe run for each entry whose next-fire time has
//! elapsed. A run re-fetches the definition, advances its next-fire time
//! before any network I/O (start-to-start scheduling), executes the
//! [`probe`](crate::probe) runner, publishes the
//! [`metrics`](crate::metrics) gauge, and hands the outcome to the
//! [`status`](crate::status) writer, which maintains a transition-compressed,
//! optionally bounded condition history under optimistic concurrency.
//!
//! The store itself is behind the [`Store`](crate::store::Store) trait; the
//! embedding process wires its client (and the scrape endpoint and watch
//! re-delivery) around the engine. [`MemoryStore`](crate::store::MemoryStore)
//! is a complete in-process implementation for tests and local wiring.
//!
//! ## Error policy
//!
//! The core performs no inline retries. Failed reconciles are re-delivered
//! by the watch framework; failed or conflicted status writes are dropped
//! and settled by the next probe cycle. A failed probe is not an error at
//! all — it is the observation being reported.

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod probe;
pub mod reconciler;
pub mod registry;
pub mod resource;
pub mod scheduler;
pub mod status;
pub mod store;
pub mod validate;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use probe::ProbeOutcome;
pub use reconciler::Reconciler;
pub use registry::{Registry, RegistryEntry};
pub use resource::{
    Condition, ConditionStatus, HttpProbe, NetworkTest, NetworkTestSpec, NetworkTestStatus,
    ObjectMeta, ProbeResult, ResourceKey, TcpProbe,
};
pub use scheduler::Scheduler;
pub use store::{MemoryStore, Store, WatchEvent};
pub use validate::{validate, Admission};
