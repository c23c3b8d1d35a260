//! Probe runners for HTTP and TCP reachability tests.
//!
//! Both runners return a [`ProbeOutcome`] on every path: network failures
//! and timeouts are outcomes, not errors. Reachability here means "the
//! request completed" (HTTP) or "dial plus optional payload write
//! completed" (TCP); neither runner reads from the socket.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::error::{EngineError, Result};
use crate::resource::{HttpProbe, NetworkTestSpec, ProbeResult, TcpProbe};

/// Result of a single probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub success: bool,
    pub message: String,
}

impl ProbeOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// The status-field rendering of this outcome.
    pub fn result(&self) -> ProbeResult {
        if self.success {
            ProbeResult::Success
        } else {
            ProbeResult::Failed
        }
    }
}

/// Run the probe a spec describes. Fails with a validation error when the
/// spec carries no probe subkind; the reconciler prevents such specs from
/// being scheduled, so hitting this means the definition mutated mid-flight.
pub async fn run(spec: &NetworkTestSpec) -> Result<ProbeOutcome> {
    let timeout = spec.timeout();
    if let Some(http) = &spec.http {
        Ok(run_http(http, timeout).await)
    } else if let Some(tcp) = &spec.tcp {
        Ok(run_tcp(tcp, timeout).await)
    } else {
        Err(EngineError::Validation("no probe defined".to_string()))
    }
}

/// Issue a GET against the probe URL with an overall deadline.
///
/// Success means the request completed and the status code is not listed in
/// `fail_on_codes`; an empty list accepts any completed response. Redirects
/// follow the client library default.
pub async fn run_http(probe: &HttpProbe, timeout: Duration) -> ProbeOutcome {
    let client = match reqwest::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(probe.tls_skip_verify)
        .build()
    {
        Ok(client) => client,
        Err(e) => return ProbeOutcome::failure(format!("failed to build HTTP client: {e}")),
    };

    match client.get(&probe.url).send().await {
        Ok(response) => {
            let status = response.status();
            let message = format!("http result: {status}");
            if probe.fail_on_codes.contains(&status.as_u16()) {
                ProbeOutcome::failure(message)
            } else {
                ProbeOutcome::success(message)
            }
        }
        Err(e) if e.is_timeout() => ProbeOutcome::failure(format!("timeout: {e}")),
        Err(e) => ProbeOutcome::failure(e.to_string()),
    }
}

/// Dial `address:port` and, when configured, write the payload.
///
/// The deadline covers the dial and the write together. A completed dial
/// with no payload succeeds with the resolved remote address as message; a
/// partial write or write error fails. The connection is closed before
/// returning in all cases.
pub async fn run_tcp(probe: &TcpProbe, timeout: Duration) -> ProbeOutcome {
    let target = format!("{}:{}", probe.address, probe.port);

    let attempt = async {
        let mut stream = match TcpStream::connect(&target).await {
            Ok(stream) => stream,
            Err(e) => return ProbeOutcome::failure(e.to_string()),
        };

        let remote = match stream.peer_addr() {
            Ok(addr) => addr.to_string(),
            Err(_) => target.clone(),
        };

        if let Some(data) = probe.data.as_deref().filter(|d| !d.is_empty()) {
            if let Err(e) = stream.write_all(data.as_bytes()).await {
                return ProbeOutcome::failure(format!("failed to write data: {e}"));
            }
        }

        ProbeOutcome::success(remote)
    };

    match tokio::time::timeout(timeout, attempt).await {
        Ok(outcome) => outcome,
        Err(_) => ProbeOutcome::failure(format!("timeout: dial {target} exceeded {}s", timeout.as_secs())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http_probe(url: String, fail_on_codes: Vec<u16>) -> HttpProbe {
        HttpProbe {
            url,
            fail_on_codes,
            tls_skip_verify: false,
        }
    }

    #[tokio::test]
    async fn http_success_when_no_fail_codes_listed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let outcome = run_http(
            &http_probe(format!("{}/ok", server.uri()), vec![]),
            Duration::from_secs(5),
        )
        .await;

        assert!(outcome.success);
        assert!(outcome.message.contains("200"), "message: {}", outcome.message);
    }

    #[tokio::test]
    async fn http_any_completed_response_succeeds_with_empty_fail_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = run_http(
            &http_probe(format!("{}/broken", server.uri()), vec![]),
            Duration::from_secs(5),
        )
        .await;

        assert!(outcome.success);
    }

    #[tokio::test]
    async fn http_listed_status_code_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = run_http(
            &http_probe(format!("{}/broken", server.uri()), vec![500, 502, 503]),
            Duration::from_secs(5),
        )
        .await;

        assert!(!outcome.success);
        assert!(outcome.message.contains("500"), "message: {}", outcome.message);
    }

    #[tokio::test]
    async fn http_deadline_trips_with_timeout_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let outcome = run_http(
            &http_probe(format!("{}/slow", server.uri()), vec![]),
            Duration::from_millis(100),
        )
        .await;

        assert!(!outcome.success);
        assert!(
            outcome.message.starts_with("timeout:"),
            "message: {}",
            outcome.message
        );
    }

    #[tokio::test]
    async fn tcp_dial_succeeds_with_remote_address_message() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let outcome = run_tcp(
            &TcpProbe {
                address: addr.ip().to_string(),
                port: addr.port() as i32,
                data: None,
            },
            Duration::from_secs(1),
        )
        .await;

        assert!(outcome.success);
        assert_eq!(outcome.message, addr.to_string());
    }

    #[tokio::test]
    async fn tcp_payload_is_written_in_full() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            socket.read_to_end(&mut buf).await.unwrap();
            buf
        });

        let outcome = run_tcp(
            &TcpProbe {
                address: addr.ip().to_string(),
                port: addr.port() as i32,
                data: Some("ping".to_string()),
            },
            Duration::from_secs(1),
        )
        .await;

        assert!(outcome.success);
        assert_eq!(outcome.message, addr.to_string());
        assert_eq!(received.await.unwrap(), b"ping");
    }

    #[tokio::test]
    async fn tcp_refused_connection_fails() {
        // Bind and immediately drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = run_tcp(
            &TcpProbe {
                address: addr.ip().to_string(),
                port: addr.port() as i32,
                data: None,
            },
            Duration::from_secs(1),
        )
        .await;

        assert!(!outcome.success);
        assert!(!outcome.message.is_empty());
    }

    #[tokio::test]
    async fn run_rejects_spec_without_probe() {
        let spec = NetworkTestSpec::default();
        assert!(matches!(
            run(&spec).await,
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn outcome_renders_result_strings() {
        assert_eq!(ProbeOutcome::success("ok").result().to_string(), "Success");
        assert_eq!(ProbeOutcome::failure("no").result().to_string(), "Failed");
    }
}
