//! Blocking client for querying a single Apache Solr core.
//!
//! # Overview
//! Turns `GetParams` / `SearchParams` into `/select` query strings, executes
//! one HTTP GET per call, and maps Solr's JSON envelope back into a
//! `Document` or a `SearchResponse`. Indexing, retries and caching are out of
//! scope; every call is a single request/response exchange.
//!
//! # Design
//! - `SolrClient` holds only the core URL, a verbosity flag and its
//!   `Transport`, and is never mutated after construction.
//! - Each operation is split into `build_*` (produces `HttpRequest`) and
//!   `parse_*` (consumes `HttpResponse`); `get` / `search` / `search_text`
//!   run the pair through the transport.
//! - Every failure is a `SolrError`; no partially decoded envelope reaches
//!   the caller.
//!
//! ```no_run
//! use solr_core::{GetParams, SearchParams, SolrClient};
//!
//! let solr = SolrClient::new("http://localhost:8983/solr/books", true);
//! let book = solr.get(&GetParams::new("id:42"))?;
//! let page = solr.search(SearchParams::new("title:dune").with_facet("category"))?;
//! println!("{} of {} results", page.documents.len(), page.num_found);
//! # let _ = book;
//! # Ok::<(), solr_core::SolrError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod transport;
pub mod types;

pub use client::SolrClient;
pub use config::ClientConfig;
pub use error::SolrError;
pub use http::{HttpRequest, HttpResponse};
pub use params::{FacetOptions, GetParams, SearchParams};
pub use transport::{Transport, TransportConfig, UreqTransport};
pub use types::{
    Document, ErrorInfo, Facet, FacetCounts, FacetValue, ResponseData, ResponseHeader,
    ResponseRaw, SearchResponse,
};
