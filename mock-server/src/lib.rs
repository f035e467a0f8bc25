//! In-memory stand-in for a Solr server's `/select` handler.
//!
//! Supports the subset of the query dialect the client tests need: `q`,
//! `fq`, `sort`, `start`, `rows`, `fl`, field faceting and `wt=xml`. Query
//! matching is deliberately simple (`*:*`, `field:value`, bare terms).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

pub type Doc = Map<String, Value>;

const DEFAULT_ROWS: usize = 10;

/// Cores served by the mock, keyed by core name.
#[derive(Clone, Debug, Default)]
pub struct Cores {
    docs: HashMap<String, Vec<Doc>>,
    unavailable: HashSet<String>,
}

impl Cores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with the given documents. Non-object values are
    /// skipped.
    pub fn with_core(mut self, name: &str, docs: Vec<Value>) -> Self {
        let docs = docs
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.docs.insert(name.to_string(), docs);
        self
    }

    /// Register `name` as a core that answers every request with a 500.
    pub fn with_unavailable_core(mut self, name: &str) -> Self {
        self.unavailable.insert(name.to_string());
        self
    }
}

/// A small book catalogue used by the standalone binary and the tests.
pub fn sample_cores() -> Cores {
    Cores::new()
        .with_core(
            "books",
            vec![
                json!({"id": "1", "title": "Dune", "author": "Frank Herbert", "category": "fiction", "year": 1965}),
                json!({"id": "2", "title": "Dune Messiah", "author": "Frank Herbert", "category": "fiction", "year": 1969}),
                json!({"id": "3", "title": "Cosmos", "author": "Carl Sagan", "category": "science", "year": 1980}),
                json!({"id": "4", "title": "Contact", "author": "Carl Sagan", "category": "fiction", "year": 1985}),
                json!({"id": "5", "title": "The Selfish Gene", "author": "Richard Dawkins", "category": "science", "year": 1976}),
                json!({"id": "6", "title": "Foundation", "author": "Isaac Asimov", "category": "fiction", "year": 1951, "tags": ["classic", "series"]}),
            ],
        )
        .with_unavailable_core("offline")
}

pub fn app(cores: Cores) -> Router {
    Router::new()
        .route("/solr/{core}/select", get(select))
        .with_state(Arc::new(cores))
}

pub async fn run(listener: TcpListener, cores: Cores) -> Result<(), std::io::Error> {
    axum::serve(listener, app(cores)).await
}

/// Query parameters in arrival order; keys may repeat (`fq`, `facet.field`).
struct Params(Vec<(String, String)>);

impl Params {
    fn first(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn number(&self, key: &str) -> Option<usize> {
        self.first(key).and_then(|v| v.parse().ok())
    }
}

async fn select(
    State(cores): State<Arc<Cores>>,
    Path(core): Path<String>,
    Query(raw): Query<Vec<(String, String)>>,
) -> Response {
    let params = Params(raw);
    tracing::debug!(%core, params = ?params.0, "select");

    if cores.unavailable.contains(&core) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            "core unavailable",
        )
            .into_response();
    }
    let Some(docs) = cores.docs.get(&core) else {
        return (
            StatusCode::NOT_FOUND,
            Html(format!(
                "<html><body><h2>HTTP ERROR 404 Not Found</h2><p>No such core: {core}</p></body></html>"
            )),
        )
            .into_response();
    };

    if params.first("wt") == Some("xml") {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/xml")],
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<response><lst name=\"responseHeader\"><int name=\"status\">0</int></lst></response>",
        )
            .into_response();
    }

    let q = params.first("q").unwrap_or("*:*");
    let filters = params.all("fq");
    if let Some(bad) = std::iter::once(q).chain(filters.iter().copied()).find(|e| !balanced(e)) {
        return syntax_error(bad);
    }

    let mut matched: Vec<&Doc> = docs
        .iter()
        .filter(|doc| matches(doc, q) && filters.iter().all(|fq| matches(doc, fq)))
        .collect();
    if let Some(sort) = params.first("sort") {
        sort_docs(&mut matched, sort);
    }

    let num_found = matched.len();
    let start = params.number("start").unwrap_or(0);
    let rows = params.number("rows").unwrap_or(DEFAULT_ROWS);
    let fields: Option<Vec<&str>> = params
        .first("fl")
        .map(|fl| fl.split(',').map(str::trim).filter(|f| !f.is_empty()).collect());
    let page: Vec<Value> = matched
        .iter()
        .skip(start)
        .take(rows)
        .map(|doc| Value::Object(project(doc, fields.as_deref())))
        .collect();

    let mut body = json!({
        "responseHeader": {"status": 0, "QTime": 0},
        "response": {"numFound": num_found, "start": start, "docs": page}
    });
    if params.first("facet") == Some("on") || params.first("facet") == Some("true") {
        body["facet_counts"] = json!({
            "facet_queries": {},
            "facet_fields": facet_fields(&params, &matched),
        });
    }
    Json(body).into_response()
}

fn syntax_error(expr: &str) -> Response {
    let msg = format!("org.apache.solr.search.SyntaxError: Cannot parse '{expr}'");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "responseHeader": {"status": 400, "QTime": 0},
            "error": {
                "metadata": ["error-class", "org.apache.solr.common.SolrException"],
                "msg": msg,
                "code": 400
            }
        })),
    )
        .into_response()
}

fn balanced(expr: &str) -> bool {
    let mut depth = 0i32;
    let mut in_quotes = false;
    for c in expr.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0 && !in_quotes
}

fn matches(doc: &Doc, expr: &str) -> bool {
    let expr = expr.trim();
    if expr.is_empty() || expr == "*:*" || expr == "*" {
        return true;
    }
    match expr.split_once(':') {
        Some((field, value)) => {
            let value = value.trim_matches('"');
            match doc.get(field) {
                None => false,
                Some(_) if value == "*" => true,
                Some(Value::Array(items)) => items.iter().any(|item| scalar_eq(item, value)),
                Some(other) => scalar_eq(other, value),
            }
        }
        None => {
            let term = expr.trim_matches('"').to_lowercase();
            doc.values().any(|v| match v {
                Value::String(s) => s.to_lowercase().contains(&term),
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|s| s.to_lowercase().contains(&term)),
                _ => false,
            })
        }
    }
}

fn scalar_eq(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

fn sort_key(value: Option<&Value>) -> (u8, f64, String) {
    match value {
        Some(Value::Number(n)) => (0, n.as_f64().unwrap_or(0.0), String::new()),
        Some(Value::String(s)) => (1, 0.0, s.clone()),
        Some(other) => (1, 0.0, other.to_string()),
        None => (2, 0.0, String::new()),
    }
}

fn sort_docs(docs: &mut [&Doc], sort: &str) {
    let mut parts = sort.split_whitespace();
    let Some(field) = parts.next() else {
        return;
    };
    let descending = parts.next().is_some_and(|dir| dir.eq_ignore_ascii_case("desc"));
    docs.sort_by(|a, b| {
        let (ka, kb) = (sort_key(a.get(field)), sort_key(b.get(field)));
        let ord = ka
            .0
            .cmp(&kb.0)
            .then(ka.1.total_cmp(&kb.1))
            .then_with(|| ka.2.cmp(&kb.2));
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

fn project(doc: &Doc, fields: Option<&[&str]>) -> Doc {
    match fields {
        None => doc.clone(),
        Some(fields) if fields.contains(&"*") => doc.clone(),
        Some(fields) => doc
            .iter()
            .filter(|(k, _)| fields.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

fn facet_setting(params: &Params, field: &str, name: &str) -> Option<i64> {
    params
        .first(&format!("f.{field}.facet.{name}"))
        .or_else(|| params.first(&format!("facet.{name}")))
        .and_then(|v| v.parse().ok())
}

/// Solr's flat `[value, count, ...]` layout, counts descending then value
/// ascending.
fn facet_fields(params: &Params, docs: &[&Doc]) -> Map<String, Value> {
    let mut out = Map::new();
    for field in params.all("facet.field") {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for doc in docs {
            let values: Vec<&Value> = match doc.get(field) {
                Some(Value::Array(items)) => items.iter().collect(),
                Some(v) => vec![v],
                None => Vec::new(),
            };
            for v in values {
                let key = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                *counts.entry(key).or_default() += 1;
            }
        }
        let mincount = facet_setting(params, field, "mincount").unwrap_or(0).max(0) as u64;
        // A negative limit means unlimited, as in Solr.
        let limit = facet_setting(params, field, "limit").unwrap_or(100);
        let mut sorted: Vec<(String, u64)> =
            counts.into_iter().filter(|(_, c)| *c >= mincount).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if limit >= 0 {
            sorted.truncate(limit as usize);
        }
        let flat = sorted
            .into_iter()
            .flat_map(|(value, count)| [Value::String(value), Value::from(count)])
            .collect();
        out.insert(field.to_string(), Value::Array(flat));
    }
    out
}
