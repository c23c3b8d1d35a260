//! Engine tuning knobs.
//!
//! The core takes a plain config struct; loading it from files, flags or
//! the environment is the embedding process's business.

use std::time::Duration;

/// Configuration for the probe engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on how long the scheduler sleeps between iterations when
    /// no wake signal arrives. This bounds scheduling latency after a
    /// registry disturbance; probes with intervals shorter than the tick
    /// fire at tick granularity.
    pub tick_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(30),
        }
    }
}
