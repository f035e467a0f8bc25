//! Solr response envelope and the caller-facing result types.
//!
//! # Design
//! `ResponseRaw` mirrors the JSON Solr writes (`responseHeader`, `response`,
//! `facet_counts`, `error`) with every section defaulted, so a response that
//! omits a section still decodes. `SearchResponse` is what callers see: the
//! documents and counts from the envelope next to the `SearchParams` that
//! produced them, with facet arrays split into value/count pairs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::params::SearchParams;

/// Solr's default page size when `rows` is not given.
pub const DEFAULT_ROWS: u64 = 10;

/// One stored document. The schema belongs to the Solr core, so fields are
/// kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(pub Map<String, Value>);

impl Document {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String value of `field`. Single-element arrays, which multi-valued
    /// Solr fields produce, are unwrapped.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        match self.0.get(field)? {
            Value::String(s) => Some(s),
            Value::Array(values) if values.len() == 1 => values[0].as_str(),
            _ => None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// The full JSON envelope of a `/select` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseRaw {
    #[serde(rename = "responseHeader", default)]
    pub header: ResponseHeader,
    #[serde(rename = "response", default)]
    pub data: ResponseData,
    #[serde(default)]
    pub facet_counts: FacetCounts,
    #[serde(default)]
    pub error: ErrorInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseHeader {
    #[serde(default)]
    pub status: i64,
    #[serde(rename = "QTime", default)]
    pub qtime: u64,
    /// Parameters as Solr echoes them back. Only present with
    /// `echoParams`; values are strings or arrays of strings.
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    #[serde(rename = "numFound", default)]
    pub num_found: u64,
    #[serde(default)]
    pub start: u64,
    #[serde(rename = "docs", default)]
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetCounts {
    #[serde(default)]
    pub facet_queries: BTreeMap<String, u64>,
    /// Field name to a flat `[value, count, value, count, ...]` array.
    #[serde(default)]
    pub facet_fields: BTreeMap<String, Vec<Value>>,
}

/// The `error` section. Empty on success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub trace: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub metadata: Vec<Value>,
}

impl ErrorInfo {
    pub fn is_empty(&self) -> bool {
        self.trace.is_empty() && self.msg.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub field: String,
    pub values: Vec<FacetValue>,
}

impl Facet {
    fn from_flat(field: String, flat: Vec<Value>) -> Self {
        let values = flat
            .chunks(2)
            .filter_map(|pair| match pair {
                [value, count] => Some(FacetValue {
                    value: match value {
                        Value::String(s) => s.clone(),
                        Value::Null => String::new(),
                        other => other.to_string(),
                    },
                    count: count.as_u64()?,
                }),
                _ => None,
            })
            .collect();
        Self { field, values }
    }
}

/// Search results paired with the parameters that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub params: SearchParams,
    pub header: ResponseHeader,
    pub documents: Vec<Document>,
    pub num_found: u64,
    pub start: u64,
    pub facets: Vec<Facet>,
    pub facet_queries: BTreeMap<String, u64>,
}

impl SearchResponse {
    pub fn new(params: SearchParams, raw: ResponseRaw) -> Self {
        let facets = raw
            .facet_counts
            .facet_fields
            .into_iter()
            .map(|(field, flat)| Facet::from_flat(field, flat))
            .collect();
        Self {
            params,
            header: raw.header,
            documents: raw.data.documents,
            num_found: raw.data.num_found,
            start: raw.data.start,
            facets,
            facet_queries: raw.facet_counts.facet_queries,
        }
    }

    pub fn facet(&self, field: &str) -> Option<&Facet> {
        self.facets.iter().find(|f| f.field == field)
    }

    /// Requested page size; Solr's default when `rows` is unset or zero.
    pub fn rows(&self) -> u64 {
        match self.params.numeric_option("rows") {
            Some(0) | None => DEFAULT_ROWS,
            Some(rows) => rows,
        }
    }

    /// 1-based page number of this response.
    pub fn page(&self) -> u64 {
        self.start / self.rows() + 1
    }

    pub fn total_pages(&self) -> u64 {
        self.num_found.div_ceil(self.rows())
    }

    pub fn has_next_page(&self) -> bool {
        self.start.saturating_add(self.rows()) < self.num_found
    }

    /// Parameters for the following page, or `None` on the last one.
    pub fn next_page(&self) -> Option<SearchParams> {
        if !self.has_next_page() {
            return None;
        }
        Some(self.params_at(self.start.saturating_add(self.rows())))
    }

    /// Parameters for the preceding page, or `None` on the first one.
    pub fn previous_page(&self) -> Option<SearchParams> {
        if self.start == 0 {
            return None;
        }
        Some(self.params_at(self.start.saturating_sub(self.rows())))
    }

    fn params_at(&self, start: u64) -> SearchParams {
        self.params.clone().with_option("start", start.to_string())
    }
}
