use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, sample_cores};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn select(uri: &str) -> axum::response::Response {
    app(sample_cores())
        .oneshot(Request::builder().uri(uri).body(String::new()).unwrap())
        .await
        .unwrap()
}

fn ids(body: &Value) -> Vec<&str> {
    body["response"]["docs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect()
}

// --- matching ---

#[tokio::test]
async fn match_all_returns_every_document() {
    let resp = select("/solr/books/select?q=*%3A*").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["response"]["numFound"], 6);
    assert_eq!(body["response"]["start"], 0);
    assert_eq!(body["responseHeader"]["status"], 0);
}

#[tokio::test]
async fn field_query_selects_one_document() {
    let body = body_json(select("/solr/books/select?q=id%3A3").await).await;
    assert_eq!(ids(&body), vec!["3"]);
}

#[tokio::test]
async fn bare_term_searches_text_fields() {
    let body = body_json(select("/solr/books/select?q=dune").await).await;
    assert_eq!(body["response"]["numFound"], 2);
}

#[tokio::test]
async fn filter_queries_are_anded() {
    let body = body_json(
        select("/solr/books/select?q=*%3A*&fq=category%3Afiction&fq=author%3A%22Carl%20Sagan%22").await,
    )
    .await;
    assert_eq!(ids(&body), vec!["4"]);
}

// --- paging and projection ---

#[tokio::test]
async fn sort_start_and_rows_page_results() {
    let resp = select("/solr/books/select?q=*%3A*&sort=year%20asc&start=1&rows=2").await;
    let body = body_json(resp).await;
    assert_eq!(body["response"]["numFound"], 6);
    assert_eq!(body["response"]["start"], 1);
    assert_eq!(ids(&body), vec!["1", "2"]);
}

#[tokio::test]
async fn fl_limits_returned_fields() {
    let body = body_json(select("/solr/books/select?q=id%3A1&fl=id%2Ctitle").await).await;
    let doc = body["response"]["docs"][0].as_object().unwrap();
    assert_eq!(doc.len(), 2);
    assert_eq!(doc["title"], "Dune");
}

// --- faceting ---

#[tokio::test]
async fn facet_fields_use_flat_value_count_layout() {
    let body =
        body_json(select("/solr/books/select?q=*%3A*&facet=on&facet.field=category").await).await;
    assert_eq!(
        body["facet_counts"]["facet_fields"]["category"],
        serde_json::json!(["fiction", 4, "science", 2])
    );
}

#[tokio::test]
async fn per_field_facet_limit_applies() {
    let body = body_json(
        select("/solr/books/select?q=*%3A*&facet=on&facet.field=author&f.author.facet.limit=1").await,
    )
    .await;
    let authors = body["facet_counts"]["facet_fields"]["author"].as_array().unwrap();
    assert_eq!(authors.len(), 2);
}

#[tokio::test]
async fn no_facet_counts_without_facet_param() {
    let body = body_json(select("/solr/books/select?q=*%3A*").await).await;
    assert!(body.get("facet_counts").is_none());
}

// --- failures ---

#[tokio::test]
async fn unbalanced_query_is_400_with_error_envelope() {
    let resp = select("/solr/books/select?q=%28%28dune").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], 400);
    assert!(body["error"]["msg"].as_str().unwrap().contains("SyntaxError"));
}

#[tokio::test]
async fn unknown_core_is_404_html() {
    let resp = select("/solr/nope/select?q=x").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let ct = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(ct.starts_with("text/html"), "{ct}");
    let body = body_bytes(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("No such core: nope"));
}

#[tokio::test]
async fn unavailable_core_is_500_plain_text() {
    let resp = select("/solr/offline/select?q=x").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body_bytes(resp).await[..], b"core unavailable");
}

#[tokio::test]
async fn wt_xml_returns_xml_body() {
    let resp = select("/solr/books/select?q=*%3A*&wt=xml").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/xml");
    let body = body_bytes(resp).await;
    assert!(body.starts_with(b"<?xml"));
}
