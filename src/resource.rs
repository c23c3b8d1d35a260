//! Object model for the `NetworkTest` resource.
//!
//! This mirrors the wire format stored in the declarative store: object
//! metadata (identity plus the `generation` / `resourceVersion` tokens the
//! store maintains), a spec describing the desired probe, and a status
//! subresource carrying the observed state. Field names serialize in
//! camelCase to match the schema users see.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default probe interval when the spec leaves it empty.
pub const DEFAULT_INTERVAL: &str = "1h";

/// Default probe timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Identity of a resource within the store: `namespace/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Store-maintained metadata attached to every object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub namespace: String,
    pub name: String,
    /// Incremented by the store on every spec mutation; unchanged on
    /// status mutations.
    #[serde(default)]
    pub generation: i64,
    /// Opaque token advanced on every mutation, including status. Used for
    /// optimistic concurrency on writes.
    #[serde(default)]
    pub resource_version: String,
}

/// HTTP probe settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpProbe {
    /// Must be a valid http/https URL.
    pub url: String,
    /// HTTP status codes that fail the test. An empty list means any
    /// completed request counts as success.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fail_on_codes: Vec<u16>,
    /// Allows https without verifying the server certificate.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tls_skip_verify: bool,
}

/// Plain-socket probe settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpProbe {
    /// IP address or host name to dial. Host names are resolved at dial
    /// time, not at admission.
    pub address: String,
    /// Wire type is wide on purpose; admission checks the [1, 65535] range.
    pub port: i32,
    /// Optional payload written after a successful dial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Desired state of a `NetworkTest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkTestSpec {
    /// How often the probe runs. Valid time units are "ns", "us" (or "µs"),
    /// "ms", "s", "m", "h". Defaults to 1h.
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Seconds until a probe attempt is considered failed. Default 5.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Lets you disable tests without deleting them. Default true.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Settings for probing with an HTTP client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpProbe>,
    /// Settings for probing with a plain socket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp: Option<TcpProbe>,
    /// Number of probe result transitions kept in the status. 0 means no
    /// limit.
    #[serde(default)]
    pub history_limit: usize,
}

impl Default for NetworkTestSpec {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            timeout: default_timeout(),
            enabled: default_enabled(),
            http: None,
            tcp: None,
            history_limit: 0,
        }
    }
}

fn default_interval() -> String {
    DEFAULT_INTERVAL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_enabled() -> bool {
    true
}

impl NetworkTestSpec {
    /// The probed address, for log lines and metric labels: the URL for
    /// HTTP probes, `tcp://address:port` for TCP probes.
    pub fn address(&self) -> String {
        if let Some(http) = &self.http {
            http.url.clone()
        } else if let Some(tcp) = &self.tcp {
            format!("tcp://{}:{}", tcp.address, tcp.port)
        } else {
            "<undefined>".to_string()
        }
    }

    /// The configured interval, falling back to the 1h default when the
    /// field is empty or does not parse. An unparseable interval must not
    /// turn into a zero-length one.
    pub fn interval(&self) -> Duration {
        let raw = if self.interval.is_empty() {
            DEFAULT_INTERVAL
        } else {
            self.interval.as_str()
        };
        parse_interval(raw).unwrap_or_else(|| {
            tracing::warn!(interval = %self.interval, "Unparseable interval, falling back to 1h");
            parse_interval(DEFAULT_INTERVAL).unwrap_or(Duration::from_secs(3600))
        })
    }

    /// Probe timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Parse a duration string in the interval grammar. Accepts the "µs"
/// spelling of microseconds by normalizing it to "us" first.
fn parse_interval(raw: &str) -> Option<Duration> {
    let normalized = raw.replace("µs", "us");
    humantime::parse_duration(&normalized).ok()
}

/// Terminal result of a single probe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeResult {
    Success,
    Failed,
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeResult::Success => write!(f, "Success"),
            ProbeResult::Failed => write!(f, "Failed"),
        }
    }
}

/// Status of one entry in the transition history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
}

/// One entry in the observation's transition history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ConditionStatus,
    pub reason: String,
    /// Spec generation the probed definition had when this entry was
    /// recorded.
    pub observed_generation: i64,
    pub last_transition_time: DateTime<Utc>,
    pub message: String,
}

/// Observed state of a `NetworkTest`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkTestStatus {
    /// Whether the engine currently schedules this probe.
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result: Option<ProbeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A declared reachability test: metadata plus desired and observed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkTest {
    pub metadata: ObjectMeta,
    pub spec: NetworkTestSpec,
    #[serde(default)]
    pub status: NetworkTestStatus,
}

impl NetworkTest {
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(&self.metadata.namespace, &self.metadata.name)
    }
}
