//! Tests for engine module

use super::enricher::is_blank;
use super::*;
use crate::error::Error;
use crate::extract::Selector;
use crate::http::{HttpClientConfig, ThrottlePolicy};
use crate::mapping::RequestParts;
use crate::pagination::{HasMorePaginator, NoPaginator, Paginator};
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .throttle(ThrottlePolicy::new(
            Duration::from_millis(5),
            Duration::from_millis(5),
        ))
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

fn list_spec(path: &str, selector: &str, paginator: Arc<dyn Paginator>) -> ResourceSpec {
    ResourceSpec {
        name: "test".to_string(),
        list_path: path.to_string(),
        selector: Selector::parse(selector).unwrap(),
        paginator,
        parts: RequestParts::new().with_query("hapikey", "k"),
        detail: None,
    }
}

// ============================================================================
// FetchStats Tests
// ============================================================================

#[test]
fn test_fetch_stats_default() {
    let stats = FetchStats::new();
    assert_eq!(stats.pages_fetched, 0);
    assert_eq!(stats.entries_emitted, 0);
    assert!(!stats.stopped_at_boundary);
}

#[test]
fn test_fetch_stats_add_page() {
    let mut stats = FetchStats::new();
    stats.add_page(2);
    stats.add_page(0);
    stats.add_entry();
    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.throttled_retries, 2);
    assert_eq!(stats.entries_emitted, 1);
}

#[test]
fn test_is_blank() {
    assert!(is_blank(&json!(null)));
    assert!(is_blank(&json!({})));
    assert!(!is_blank(&json!({"dealId": 1})));
    assert!(!is_blank(&json!(0)));
}

// ============================================================================
// PagedFetcher Tests
// ============================================================================

#[tokio::test]
async fn test_fetcher_concatenates_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/deals/v1/deal/paged"))
        .and(query_param_is_missing("offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deals": [{"dealId": 1}, {"dealId": 2}],
            "hasMore": true,
            "offset": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/deals/v1/deal/paged"))
        .and(query_param("offset", "2"))
        .and(query_param("hapikey", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deals": [{"dealId": 3}],
            "hasMore": false,
            "offset": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let spec = list_spec(
        "/deals/v1/deal/paged",
        "!.deals.*",
        Arc::new(HasMorePaginator::new()),
    );
    let mut pipeline = Pipeline::open(client_for(&server), spec, CancellationToken::new());

    let mut entries = Vec::new();
    while let Some(entry) = pipeline.next_entry().await.unwrap() {
        entries.push(entry);
    }

    assert_eq!(entries, vec![json!({"dealId": 1}), json!({"dealId": 2}), json!({"dealId": 3})]);
    assert!(!pipeline.failed());
    let stats = pipeline.stats();
    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.entries_emitted, 3);

    // Exhausted fetchers stay exhausted without further requests
    assert!(pipeline.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetcher_empty_pages_continue() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param_is_missing("vidOffset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contacts": [],
            "has-more": true,
            "vid-offset": 10
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("vidOffset", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contacts": [{"vid": 11}],
            "has-more": false,
            "vid-offset": 11
        })))
        .mount(&server)
        .await;

    let spec = list_spec("/contacts", "!.contacts.*", Arc::new(HasMorePaginator::new()));
    let entries = Pipeline::open(client_for(&server), spec, CancellationToken::new())
        .collect()
        .await
        .unwrap();
    assert_eq!(entries, vec![json!({"vid": 11})]);
}

#[tokio::test]
async fn test_fetcher_single_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/owners/v2/owners/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"ownerId": 1}, {"ownerId": 2}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let spec = list_spec("/owners/v2/owners/", "!.*", Arc::new(NoPaginator));
    let entries = Pipeline::open(client_for(&server), spec, CancellationToken::new())
        .collect()
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn test_fetcher_stops_at_since_boundary() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param_is_missing("timeOffset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contacts": [{"vid": 1}, {"vid": 2}],
            "has-more": true,
            "vid-offset": 2,
            "time-offset": 500
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("timeOffset", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"contacts": []})))
        .expect(0)
        .mount(&server)
        .await;

    let paginator = HasMorePaginator::new().with_time_cursor("time-offset", "timeOffset", 1_000);
    let spec = list_spec("/contacts", "!.contacts.*", Arc::new(paginator));
    let mut pipeline = Pipeline::open(client_for(&server), spec, CancellationToken::new());

    let mut entries = Vec::new();
    while let Some(entry) = pipeline.next_entry().await.unwrap() {
        entries.push(entry);
    }

    // The boundary page's own entries are still delivered
    assert_eq!(entries.len(), 2);
    assert!(pipeline.stats().stopped_at_boundary);
    assert_eq!(pipeline.stats().pages_fetched, 1);
}

#[tokio::test]
async fn test_fetcher_error_is_terminal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let spec = list_spec("/x", "!.*", Arc::new(HasMorePaginator::new()));
    let mut pipeline = Pipeline::open(client_for(&server), spec, CancellationToken::new());

    let err = pipeline.next_entry().await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    assert!(pipeline.next_entry().await.unwrap().is_none());
    assert!(pipeline.failed());
}

#[tokio::test]
async fn test_fetcher_malformed_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[{"))
        .mount(&server)
        .await;

    let spec = list_spec("/x", "!.*", Arc::new(NoPaginator));
    let mut pipeline = Pipeline::open(client_for(&server), spec, CancellationToken::new());
    assert!(matches!(
        pipeline.next_entry().await.unwrap_err(),
        Error::Parse(_)
    ));
}

#[tokio::test]
async fn test_fetcher_cancelled_before_start() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1])))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let spec = list_spec("/x", "!.*", Arc::new(NoPaginator));
    let mut pipeline = Pipeline::open(client_for(&server), spec, cancel);

    assert!(pipeline.next_entry().await.unwrap_err().is_cancelled());
    assert!(pipeline.next_entry().await.unwrap().is_none());
    assert!(pipeline.failed());
}

#[tokio::test]
async fn test_fetcher_cancelled_mid_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let spec = list_spec("/x", "!.*", Arc::new(NoPaginator));
    let mut pipeline = Pipeline::open(client_for(&server), spec, cancel.clone());

    assert_eq!(pipeline.next_entry().await.unwrap(), Some(json!(1)));
    cancel.cancel();
    assert!(pipeline.next_entry().await.unwrap_err().is_cancelled());
    assert!(pipeline.next_entry().await.unwrap().is_none());
}

// ============================================================================
// DetailEnricher Tests
// ============================================================================

#[tokio::test]
async fn test_enricher_replaces_entries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/deals/v1/deal/paged"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deals": [{"dealId": 1}, null, {}, {"dealId": 2}],
            "hasMore": false
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/deals/v1/deal/\d+$"))
        .and(query_param("includePropertyVersions", "true"))
        .respond_with(|req: &wiremock::Request| {
            let id = req.url.path().rsplit('/').next().unwrap_or_default().to_string();
            ResponseTemplate::new(200).set_body_json(json!({"dealId": id, "detailed": true}))
        })
        .expect(2)
        .mount(&server)
        .await;

    let mut spec = list_spec(
        "/deals/v1/deal/paged",
        "!.deals.*",
        Arc::new(HasMorePaginator::new()),
    );
    spec.detail = Some(DetailSpec::new(
        "/deals/v1/deal/{dealId}",
        RequestParts::new().with_query("includePropertyVersions", true),
    ));

    let mut pipeline = Pipeline::open(client_for(&server), spec, CancellationToken::new());
    let mut entries = Vec::new();
    while let Some(entry) = pipeline.next_entry().await.unwrap() {
        entries.push(entry);
    }

    assert_eq!(
        entries,
        vec![
            json!({"dealId": "1", "detailed": true}),
            json!({"dealId": "2", "detailed": true}),
        ]
    );
    let stats = pipeline.stats();
    assert_eq!(stats.detail_requests, 2);
    assert_eq!(stats.entries_skipped, 2);
    assert_eq!(stats.entries_emitted, 2);
}

#[tokio::test]
async fn test_enricher_missing_id_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "no id"}])))
        .mount(&server)
        .await;

    let mut spec = list_spec("/list", "!.*", Arc::new(NoPaginator));
    spec.detail = Some(DetailSpec::new("/detail/{id}", RequestParts::new()));

    let mut pipeline = Pipeline::open(client_for(&server), spec, CancellationToken::new());
    assert!(matches!(
        pipeline.next_entry().await.unwrap_err(),
        Error::UndefinedVariable { .. }
    ));
    assert!(pipeline.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_enricher_detail_error_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/detail/1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/detail/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let mut spec = list_spec("/list", "!.*", Arc::new(NoPaginator));
    spec.detail = Some(DetailSpec::new("/detail/{id}", RequestParts::new()));

    let mut pipeline = Pipeline::open(client_for(&server), spec, CancellationToken::new());
    assert!(matches!(
        pipeline.next_entry().await.unwrap_err(),
        Error::HttpStatus { status: 404, .. }
    ));
    assert!(pipeline.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_enricher_counts_detail_throttling() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/detail/1"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"policyName": "SECONDLY"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/detail/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "full": true})))
        .mount(&server)
        .await;

    let mut spec = list_spec("/list", "!.*", Arc::new(NoPaginator));
    spec.detail = Some(DetailSpec::new("/detail/{id}", RequestParts::new()));

    let mut pipeline = Pipeline::open(client_for(&server), spec, CancellationToken::new());
    assert_eq!(
        pipeline.next_entry().await.unwrap(),
        Some(json!({"id": 1, "full": true}))
    );
    assert_eq!(pipeline.stats().throttled_retries, 1);
}

// ============================================================================
// Stream Tests
// ============================================================================

#[tokio::test]
async fn test_into_stream() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [1, 2]})))
        .mount(&server)
        .await;

    let spec = list_spec("/x", "!.results.*", Arc::new(NoPaginator));
    let pipeline = Pipeline::open(client_for(&server), spec, CancellationToken::new());
    assert_eq!(pipeline.name(), "test");

    let entries: Vec<Value> = pipeline.into_stream().try_collect().await.unwrap();
    assert_eq!(entries, vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn test_into_stream_surfaces_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let spec = list_spec("/x", "!.*", Arc::new(NoPaginator));
    let result: Result<Vec<Value>> = Pipeline::open(client_for(&server), spec, CancellationToken::new())
        .into_stream()
        .try_collect()
        .await;
    assert!(matches!(result, Err(Error::HttpStatus { status: 403, .. })));
}
