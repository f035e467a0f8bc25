//! Executes `HttpRequest` values over the network.
//!
//! # Design
//! `Transport` is the only I/O seam in the crate. `UreqTransport` is the
//! blocking default; tests substitute stubs that return canned
//! `HttpResponse` values. Non-2xx statuses are returned as data so that
//! `client` does all status interpretation in one place.

use std::time::Duration;

use crate::error::SolrError;
use crate::http::{HttpRequest, HttpResponse};

/// Performs exactly one HTTP GET per call and fully reads the body.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, SolrError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, SolrError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, SolrError> {
        (**self).execute(request)
    }
}

/// Per-client HTTP settings. Nothing is taken from process-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportConfig {
    /// Upper bound on the whole exchange, body read included.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub user_agent: Option<String>,
    /// Largest response body accepted, in bytes. `None` reads bodies of any
    /// size; ureq's own 10 MiB default is never applied.
    pub max_body_bytes: Option<u64>,
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let mut builder = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .timeout_connect(config.connect_timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        Self {
            agent: builder.build().new_agent(),
            max_body_bytes: config.max_body_bytes.unwrap_or(u64::MAX),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, SolrError> {
        let mut builder = self.agent.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let mut response = builder
            .call()
            .map_err(|e| SolrError::Transport(e.to_string()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // The body is dropped with `response` on every path out of here.
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_string()
            .map_err(|e| SolrError::Transport(format!("reading response body: {e}")))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use super::*;

    /// Serve one canned 200 JSON response on a random port.
    fn serve_once(body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            // The client may hang up early when it enforces a limit.
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body.as_bytes());
        });
        format!("http://{addr}/solr/big")
    }

    /// A single-document envelope whose body exceeds 11 MiB.
    fn large_envelope() -> String {
        let blob = "x".repeat(11 * 1024 * 1024);
        serde_json::json!({
            "response": {"numFound": 1, "start": 0, "docs": [{"id": "1", "text": blob}]}
        })
        .to_string()
    }

    #[test]
    fn bodies_past_ureq_default_limit_are_read_in_full() {
        let body = large_envelope();
        let expected_len = body.len();
        let url = format!("{}/select?q=id%3A1", serve_once(body));
        let response = UreqTransport::default()
            .execute(&HttpRequest::get(url))
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.len(), expected_len);
    }

    #[test]
    fn get_decodes_a_large_single_document() {
        let core_url = serve_once(large_envelope());
        let doc = crate::SolrClient::new(&core_url, false)
            .get(&crate::GetParams::new("id:1"))
            .unwrap();
        assert_eq!(doc.get_str("id"), Some("1"));
        assert_eq!(doc.get_str("text").map(str::len), Some(11 * 1024 * 1024));
    }

    #[test]
    fn configured_body_limit_is_a_transport_error() {
        let url = format!("{}/select?q=id%3A1", serve_once(large_envelope()));
        let transport = UreqTransport::new(&TransportConfig {
            max_body_bytes: Some(1024 * 1024),
            ..Default::default()
        });
        let err = transport.execute(&HttpRequest::get(url)).unwrap_err();
        assert!(matches!(err, SolrError::Transport(_)), "{err}");
    }

    #[test]
    fn connection_refused_is_a_transport_error() {
        // Bind then drop to get a port with nothing listening on it.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = UreqTransport::new(&TransportConfig {
            connect_timeout: Some(Duration::from_secs(2)),
            ..Default::default()
        });
        let request = HttpRequest::get(format!("http://127.0.0.1:{port}/solr/x/select?q=a"));
        let err = transport.execute(&request).unwrap_err();
        assert!(matches!(err, SolrError::Transport(_)), "{err}");
        assert!(err.to_string().starts_with("transport error:"));
    }
}
