//! Error taxonomy for the probe engine.
//!
//! Probe failures are not errors: a failed HTTP or TCP probe is an expected
//! outcome and is recorded in the resource status. The variants here cover
//! the ways the engine itself can fail. The engine performs no inline
//! retries; reconcile errors are settled by watch re-delivery and status
//! write errors by the next probe cycle.

use thiserror::Error as ThisError;

use crate::resource::ResourceKey;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(ThisError, Debug)]
pub enum EngineError {
    /// The probe spec is malformed. Surfaced in the resource status with
    /// `active: false`; never retried by the engine.
    #[error("invalid probe spec: {0}")]
    Validation(String),

    /// A read or write against the declarative store failed for transient
    /// reasons (network, timeouts, apiserver hiccups).
    #[error("store error: {0}")]
    TransientStore(String),

    /// A status write was rejected because the submitted resource version
    /// was stale. Treated like a transient store error: the next reconcile
    /// or probe cycle settles it.
    #[error("conflicting status write for {key}")]
    Conflict { key: ResourceKey },

    /// Startup-time misconfiguration, e.g. failing to register a metric.
    /// Not recoverable; the embedding process terminates.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl EngineError {
    /// True for errors that the surrounding machinery (watch re-delivery,
    /// next probe cycle) will absorb without operator intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::TransientStore(_) | EngineError::Conflict { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(EngineError::TransientStore("apiserver timeout".to_string()).is_transient());
        assert!(EngineError::Conflict {
            key: ResourceKey::new("default", "web"),
        }
        .is_transient());
        assert!(!EngineError::Validation("no probe defined".to_string()).is_transient());
        assert!(!EngineError::Fatal("metric registration failed".to_string()).is_transient());
    }
}
