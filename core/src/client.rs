//! Request building, response parsing and the blocking call wrappers.
//!
//! # Design
//! `SolrClient` holds the core URL, the verbosity flag and a `Transport`;
//! none of it changes after construction, so one client can serve any
//! number of threads. Each operation is split into `build_*`, which
//! produces an `HttpRequest`, and `parse_*`, which consumes an
//! `HttpResponse`. `get`, `search` and `search_text` glue the two together
//! through the transport. Callers with their own HTTP stack can use the
//! build/parse pair directly.

use crate::config::ClientConfig;
use crate::error::{snippet, SolrError};
use crate::http::{HttpRequest, HttpResponse};
use crate::params::{GetParams, SearchParams};
use crate::transport::{Transport, TransportConfig, UreqTransport};
use crate::types::{Document, ResponseRaw, SearchResponse};

/// Blocking, stateless client for one Solr core.
#[derive(Debug, Clone)]
pub struct SolrClient<T = UreqTransport> {
    core_url: String,
    verbose: bool,
    transport: T,
}

impl SolrClient<UreqTransport> {
    /// Client with a default `ureq` transport and no timeouts.
    pub fn new(core_url: &str, verbose: bool) -> Self {
        Self::with_transport(core_url, verbose, UreqTransport::default())
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_transport(
            &config.core_url,
            config.verbose,
            UreqTransport::new(&config.transport()),
        )
    }

    pub fn with_transport_config(
        core_url: &str,
        verbose: bool,
        config: &TransportConfig,
    ) -> Self {
        Self::with_transport(core_url, verbose, UreqTransport::new(config))
    }
}

impl<T> SolrClient<T> {
    pub fn with_transport(core_url: &str, verbose: bool, transport: T) -> Self {
        Self {
            core_url: core_url.trim_end_matches('/').to_string(),
            verbose,
            transport,
        }
    }

    pub fn core_url(&self) -> &str {
        &self.core_url
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn build_get(&self, params: &GetParams) -> HttpRequest {
        self.select(&params.to_query_string())
    }

    pub fn build_search(&self, params: &SearchParams) -> HttpRequest {
        self.select(&params.to_query_string())
    }

    fn select(&self, query: &str) -> HttpRequest {
        HttpRequest::get(format!("{}/select?{query}", self.core_url))
    }

    /// An empty document means nothing matched.
    pub fn parse_get(
        &self,
        params: &GetParams,
        response: HttpResponse,
    ) -> Result<Document, SolrError> {
        let raw = decode_envelope(response)?;
        let mut documents = raw.data.documents;
        match documents.len() {
            0 => Ok(Document::default()),
            1 => Ok(documents.remove(0)),
            count => Err(SolrError::Ambiguous {
                q: params.q.clone(),
                count,
            }),
        }
    }

    pub fn parse_search(
        &self,
        params: SearchParams,
        response: HttpResponse,
    ) -> Result<SearchResponse, SolrError> {
        let raw = decode_envelope(response)?;
        tracing::debug!(
            num_found = raw.data.num_found,
            returned = raw.data.documents.len(),
            qtime = raw.header.qtime,
            "search decoded"
        );
        Ok(SearchResponse::new(params, raw))
    }
}

impl<T: Transport> SolrClient<T> {
    /// Fetch the single document matching `params.q`.
    ///
    /// Returns an empty document when nothing matches and
    /// `SolrError::Ambiguous` when more than one document does.
    pub fn get(&self, params: &GetParams) -> Result<Document, SolrError> {
        let response = self.execute(&self.build_get(params))?;
        self.parse_get(params, response)
    }

    pub fn search(&self, params: SearchParams) -> Result<SearchResponse, SolrError> {
        let response = self.execute(&self.build_search(&params))?;
        self.parse_search(params, response)
    }

    /// Search for `text` using only Solr's defaults.
    pub fn search_text(&self, text: &str) -> Result<SearchResponse, SolrError> {
        self.search(SearchParams::new(text))
    }

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, SolrError> {
        if self.verbose {
            tracing::info!(url = %request.url, "solr request");
        }
        self.transport.execute(request)
    }
}

/// Check the status, decode the envelope strictly and surface any error
/// Solr reported inside it.
fn decode_envelope(response: HttpResponse) -> Result<ResponseRaw, SolrError> {
    if !response.is_success() {
        return Err(SolrError::Http {
            status: response.status,
            reason: response.reason,
            body: response.body,
        });
    }

    let raw: ResponseRaw = match serde_json::from_str(&response.body) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(error = %e, "response is not a Solr JSON envelope");
            return Err(SolrError::Decode {
                message: e.to_string(),
                content_type: response.content_type().map(str::to_string),
                snippet: snippet(&response.body),
            });
        }
    };

    if !raw.error.is_empty() {
        return Err(SolrError::Service {
            code: raw.error.code,
            msg: raw.error.msg,
            trace: raw.error.trace,
            metadata: raw.error.metadata,
        });
    }
    Ok(raw)
}
