//! Request parameters and their Solr query-string encoding.
//!
//! # Design
//! Options and facet options are free-form string maps. Solr's accepted
//! parameters change independently of this crate, so nothing here validates
//! option names; an invalid one comes back as a Solr error. `BTreeMap` keeps
//! the encoded order stable, which makes requests easy to compare in tests
//! even though Solr does not care about parameter order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Options applied to a single facet field, e.g. `limit` or `mincount`.
pub type FacetOptions = BTreeMap<String, String>;

/// Parameters for a lookup that must match at most one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetParams {
    /// Query expression, e.g. `id:42`.
    pub q: String,
    /// Fields to return (`fl`). Empty means Solr's default field list.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Filter queries (`fq`), each emitted as its own parameter.
    #[serde(default)]
    pub filters: Vec<String>,
}

impl GetParams {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Default::default()
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_filter(mut self, fq: impl Into<String>) -> Self {
        self.filters.push(fq.into());
        self
    }

    pub fn to_query_string(&self) -> String {
        let mut qs = QueryString::default();
        qs.push("q", &self.q);
        if !self.fields.is_empty() {
            qs.push("fl", &self.fields.join(","));
        }
        for fq in &self.filters {
            qs.push("fq", fq);
        }
        qs.finish()
    }
}

/// Parameters for a free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub q: String,
    /// Passed through verbatim as `key=value` (`sort`, `rows`, `start`, ...).
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// Facet field name to its per-field options.
    #[serde(default)]
    pub facets: BTreeMap<String, FacetOptions>,
}

impl SearchParams {
    /// Search for `q` with Solr's defaults: no options, no facets.
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Default::default()
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_facet(mut self, field: impl Into<String>) -> Self {
        self.facets.entry(field.into()).or_default();
        self
    }

    pub fn with_facet_option(
        mut self,
        field: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.facets
            .entry(field.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Offset of the first requested row; 0 when unset or not a number.
    pub fn start(&self) -> u64 {
        self.numeric_option("start").unwrap_or(0)
    }

    pub(crate) fn numeric_option(&self, key: &str) -> Option<u64> {
        self.options.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn to_query_string(&self) -> String {
        let mut qs = QueryString::default();
        qs.push("q", &self.q);
        for (key, value) in &self.options {
            qs.push(key, value);
        }
        if !self.facets.is_empty() {
            qs.push("facet", "on");
        }
        for (field, options) in &self.facets {
            qs.push("facet.field", field);
            for (key, value) in options {
                let name = key.strip_prefix("facet.").unwrap_or(key);
                qs.push(&format!("f.{field}.facet.{name}"), value);
            }
        }
        qs.finish()
    }
}

#[derive(Default)]
struct QueryString {
    pairs: Vec<String>,
}

impl QueryString {
    fn push(&mut self, key: &str, value: &str) {
        self.pairs.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(value)
        ));
    }

    fn finish(self) -> String {
        self.pairs.join("&")
    }
}
