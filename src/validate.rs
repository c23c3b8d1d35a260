//! Syntactic admission checks for probe specs.
//!
//! Validation is purely syntactic: URLs must parse, ports must be in range.
//! Nothing is resolved or dialed here; host names in TCP probes are accepted
//! and left to the runner to resolve at dial time.

use url::Url;

use crate::resource::NetworkTestSpec;

/// Outcome of validating a probe spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The spec is schedulable.
    Admitted,
    /// The spec is malformed; the reason is surfaced in the resource status.
    Rejected(String),
    /// The spec is explicitly disabled. Distinct from rejection: a disabled
    /// test clears any prior observation instead of reporting an error.
    Disabled,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Validate a probe spec for scheduling.
pub fn validate(spec: &NetworkTestSpec) -> Admission {
    if !spec.enabled {
        return Admission::Disabled;
    }

    match (&spec.http, &spec.tcp) {
        (Some(_), Some(_)) => Admission::Rejected("ambiguous probe".to_string()),
        (None, None) => Admission::Rejected("no probe defined".to_string()),
        (Some(http), None) => match Url::parse(&http.url) {
            Ok(parsed) if parsed.has_host() => Admission::Admitted,
            Ok(_) => Admission::Rejected(format!(
                "failed to parse URL: no host in {}",
                http.url
            )),
            Err(e) => Admission::Rejected(format!("failed to parse URL: {e}")),
        },
        (None, Some(tcp)) => {
            if tcp.address.is_empty() {
                Admission::Rejected("address must not be empty".to_string())
            } else if !(1..=65535).contains(&tcp.port) {
                Admission::Rejected(format!("invalid port: {}", tcp.port))
            } else {
                Admission::Admitted
            }
        }
    }
}
