//! Probe result gauge.
//!
//! One gauge per probe, keyed by namespace, name and probed address, set to
//! 1.0 on success and 0.0 on failure. Registration happens against the
//! default registry; the embedding runtime owns the scrape endpoint.

use once_cell::sync::Lazy;
use prometheus::{register_gauge_vec, GaugeVec};

static PROBE_RESULT: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "networktester_probe",
        "Result of the most recent probe run (1 success, 0 failure)",
        &["namespace", "name", "address"]
    )
    .expect("Failed to register networktester_probe metric")
});

/// Record the outcome of one probe run. Concurrent writers for the same
/// label set are commutative: last writer wins on a gauge.
pub fn record_probe_result(namespace: &str, name: &str, address: &str, success: bool) {
    let value = if success { 1.0 } else { 0.0 };
    PROBE_RESULT
        .with_label_values(&[namespace, name, address])
        .set(value);
}

/// Read back the gauge for a label set. A probe that has never reported
/// reads as 0.0, the same as a failing one; the gauge distinguishes only
/// success from everything else.
pub fn probe_result_value(namespace: &str, name: &str, address: &str) -> f64 {
    PROBE_RESULT
        .with_label_values(&[namespace, name, address])
        .get()
}
