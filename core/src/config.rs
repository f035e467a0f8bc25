//! Client configuration as it appears in an embedding application's config
//! file. Loading the file is the application's job; this type only needs to
//! deserialize.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transport::TransportConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the core, e.g. `http://localhost:8983/solr/books`.
    pub core_url: String,
    /// Log every request URL.
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Response size cap; unlimited when absent.
    #[serde(default)]
    pub max_body_bytes: Option<u64>,
}

impl ClientConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout_secs.map(Duration::from_secs),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            user_agent: self.user_agent.clone(),
            max_body_bytes: self.max_body_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_core_url_is_required() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"core_url":"http://localhost:8983/solr/books"}"#).unwrap();
        assert!(!config.verbose);
        assert_eq!(config.transport(), TransportConfig::default());
    }

    #[test]
    fn timeouts_map_to_durations() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"core_url":"http://x","verbose":true,"timeout_secs":30,"connect_timeout_secs":2,"user_agent":"books-ui","max_body_bytes":52428800}"#,
        )
        .unwrap();
        let transport = config.transport();
        assert_eq!(transport.timeout, Some(Duration::from_secs(30)));
        assert_eq!(transport.connect_timeout, Some(Duration::from_secs(2)));
        assert_eq!(transport.user_agent.as_deref(), Some("books-ui"));
        assert_eq!(transport.max_body_bytes, Some(50 * 1024 * 1024));
    }

    #[test]
    fn missing_core_url_is_rejected() {
        assert!(serde_json::from_str::<ClientConfig>(r#"{"verbose":true}"#).is_err());
    }
}
