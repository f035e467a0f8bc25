//! Error types for the Solr core client.
//!
//! # Design
//! Every failure a call can hit maps to exactly one variant, in the order the
//! client checks for them: the request never completed (`Transport`), the
//! server answered with a non-2xx status (`Http`), the body was not a Solr
//! JSON envelope (`Decode`), the envelope carried an error section
//! (`Service`), or a lookup matched more than one document (`Ambiguous`).
//! Callers always get an `Err`; no half-decoded envelope escapes.

use serde_json::Value;
use thiserror::Error;

/// Number of body characters kept in `Decode` errors.
pub(crate) const SNIPPET_LEN: usize = 200;

/// Errors returned by `SolrClient` operations.
#[derive(Debug, Error)]
pub enum SolrError {
    /// The HTTP exchange itself failed: connection refused, DNS, timeout or a
    /// body that could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server returned a status outside 200-299.
    #[error("HTTP status: {status} {reason}{}", body_suffix(.body))]
    Http {
        status: u16,
        reason: String,
        body: String,
    },

    /// A 2xx response whose body is not a Solr JSON envelope.
    #[error("{message}{}. Body: {snippet}", content_type_suffix(.content_type))]
    Decode {
        message: String,
        content_type: Option<String>,
        snippet: String,
    },

    /// Solr accepted the request but reported a failure in the envelope.
    #[error("Solr error (code {code}): {msg}. Trace: {trace}{}", metadata_suffix(.metadata))]
    Service {
        code: i64,
        msg: String,
        trace: String,
        /// Solr's flat `[key, value, key, value, ...]` list, e.g.
        /// `root-error-class`.
        metadata: Vec<Value>,
    },

    /// A lookup expected at most one document but the query matched more.
    #[error("more than one document was found (q={q}, count={count})")]
    Ambiguous { q: String, count: usize },
}

impl SolrError {
    /// Whether repeating the same call could reasonably succeed.
    ///
    /// Nothing in this crate retries; this is a hint for callers that do.
    pub fn is_retryable(&self) -> bool {
        match self {
            SolrError::Transport(_) => true,
            SolrError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(". Body: {body}")
    }
}

fn content_type_suffix(content_type: &Option<String>) -> String {
    match content_type {
        Some(ct) => format!(". Response Content-Type: {ct}"),
        None => String::new(),
    }
}

fn metadata_suffix(metadata: &[Value]) -> String {
    if metadata.is_empty() {
        return String::new();
    }
    let text = |v: &Value| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let pairs: Vec<String> = metadata
        .chunks(2)
        .map(|pair| match pair {
            [key, value] => format!("{}={}", text(key), text(value)),
            [single] => text(single),
            _ => String::new(),
        })
        .collect();
    format!(". Metadata: {}", pairs.join(", "))
}

/// First `SNIPPET_LEN` characters of `body`, cut on a char boundary.
pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(SNIPPET_LEN).collect()
}
