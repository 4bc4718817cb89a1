//! Backend gateway behaviour against mock services.

use axum::http::StatusCode;
use presenter::backend::{BackendClient, BackendError, ContentOptions, SearchQuery, UpstreamBody};
use presenter::config::{PresentationConfig, PresenterConfig};
use presenter::context::RequestContext;
use presenter::routing::{ContentRouter, RequestTarget, ResolutionResult};
use serde_json::json;

mod common;

fn ctx() -> RequestContext {
    let target = RequestTarget::from_request(Some("example.com"), "/guide/a", &PresentationConfig::default());
    RequestContext::new(target, "test-request")
}

fn client(config: &PresenterConfig) -> BackendClient {
    BackendClient::new(&config.services, &config.timeouts).unwrap()
}

fn router() -> ContentRouter {
    ContentRouter::new(
        common::routing_table(r#"{"example.com": {"content": {"/guide": "proj/guide"}}}"#),
        false,
    )
}

#[tokio::test]
async fn test_search_not_found_is_empty() {
    let backend = common::start_programmable_backend(|_req| async move { (404, String::new()) }).await;
    let client = client(&common::config_for(backend));

    let results = client
        .search(&ctx(), &router(), &SearchQuery { q: "rust".into(), ..SearchQuery::default() })
        .await
        .unwrap();
    assert_eq!(results.total, 0);
    assert!(results.results.is_empty());
}

#[tokio::test]
async fn test_search_filters_hits_and_counts_pages() {
    let backend = common::start_programmable_backend(|req| async move {
        assert!(req.path.starts_with("/content-service/search?"));
        assert!(req.path.contains("q=rust"));
        assert!(req.path.contains("perPage=10"));
        let body = json!({
            "total": 25,
            "results": [
                {"contentID": "proj/guide/a", "title": "A"},
                {"contentID": "elsewhere/b", "title": "B"}
            ]
        });
        (200, body.to_string())
    })
    .await;
    let client = client(&common::config_for(backend));

    let query = SearchQuery {
        q: "rust".into(),
        per_page: Some(10),
        ..SearchQuery::default()
    };
    let results = client.search(&ctx(), &router(), &query).await.unwrap();

    assert_eq!(results.pages, 3);
    assert_eq!(results.results.len(), 1);
    assert_eq!(results.results[0].url.as_deref(), Some("https://example.com/guide/a/"));
    assert_eq!(results.results[0].extra["title"], "A");
}

#[tokio::test]
async fn test_control_sha() {
    let backend = common::start_programmable_backend(|_req| async move { (200, r#"{"sha": "abc123"}"#.to_string()) }).await;
    let sha = client(&common::config_for(backend)).control_sha(&ctx()).await.unwrap();
    assert_eq!(sha.as_deref(), Some("abc123"));

    let backend = common::start_programmable_backend(|_req| async move { (404, String::new()) }).await;
    let sha = client(&common::config_for(backend)).control_sha(&ctx()).await.unwrap();
    assert!(sha.is_none());
}

#[tokio::test]
async fn test_upstream_error_keeps_status_and_body() {
    let backend = common::start_programmable_backend(|_req| async move { (500, r#"{"error": "boom"}"#.to_string()) }).await;
    let client = client(&common::config_for(backend));

    let err = client
        .content(&ctx(), &ResolutionResult::ContentId("proj/guide/a".into()), ContentOptions::default())
        .await
        .unwrap_err();

    match err {
        BackendError::Upstream { status, body } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, UpstreamBody::Json(json!({"error": "boom"})));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_service() {
    let closed = common::closed_port().await;
    let client = client(&common::config_for(closed));
    let resolved = ResolutionResult::ContentId("proj/guide/a".into());

    let err = client
        .content(&ctx(), &resolved, ContentOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::ServiceUnavailable { .. }));
    assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

    let ignored = client
        .content(&ctx(), &resolved, ContentOptions { ignore_errors: true })
        .await
        .unwrap();
    assert!(ignored.is_none());
}

#[tokio::test]
async fn test_slow_service_times_out_as_unavailable() {
    let backend = common::start_programmable_backend(|_req| async move {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        (200, r#"{"envelope": {}}"#.to_string())
    })
    .await;
    let mut config = common::config_for(backend);
    config.timeouts.backend_secs = 1;
    let client = client(&config);

    let start = std::time::Instant::now();
    let err = client
        .content(&ctx(), &ResolutionResult::ContentId("proj/guide/a".into()), ContentOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::ServiceUnavailable { .. }), "got {err}");
    assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(start.elapsed() < std::time::Duration::from_secs(4));
}

#[tokio::test]
async fn test_sentinels_do_not_touch_network() {
    let closed = common::closed_port().await;
    let client = client(&common::config_for(closed));
    let ctx = ctx();

    let err = client
        .content(&ctx, &ResolutionResult::Unmapped, ContentOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Unmapped));

    let doc = client
        .content(&ctx, &ResolutionResult::EmptyEnvelope, ContentOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc.envelope["title"], "");
    assert!(ctx.timings.summary().is_empty());
}

#[tokio::test]
async fn test_mapping_lookup() {
    let backend = common::start_programmable_backend(|req| async move {
        if req.path == "/mapping-service/at/https:%2F%2Fexample.com%2Fold" {
            (200, r#"{"content-id": "legacy/old"}"#.to_string())
        } else {
            (404, String::new())
        }
    })
    .await;

    let mut config = common::config_for(backend);
    config.services.mapping_url = Some(format!("http://{backend}/mapping-service/"));
    let client = client(&config);

    let ctx = ctx();
    let found = client.mapping(&ctx, "https://example.com/old").await.unwrap();
    assert_eq!(found.as_deref(), Some("legacy/old"));
    assert!(ctx.timings.summary().contains_key("mapping_req_duration"));

    let missing = client.mapping(&ctx, "https://example.com/new").await.unwrap();
    assert!(missing.is_none());
}
