//! HTTP request and response values exchanged with a `Transport`.
//!
//! # Design
//! The client builds `HttpRequest` values and parses `HttpResponse` values as
//! plain data. Whoever executes the request (the bundled `UreqTransport`, a
//! test stub, or the caller's own HTTP stack) only moves bytes; status and
//! content-type interpretation stays in `client`.

/// An outbound Solr request. Only GET against `/select` is ever issued, so
/// the method is implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: String) -> Self {
        Self {
            url,
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }

    /// The encoded query string, without the leading `?`.
    pub fn query(&self) -> &str {
        self.url.split_once('?').map(|(_, q)| q).unwrap_or("")
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Reason phrase for `status`, empty when unknown.
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup; returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}
