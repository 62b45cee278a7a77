//! HTTP export fetcher tests against a local stand-in for the export API

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use lumen::config::UpstreamConfig;
use lumen::upstream::{DimensionProfile, ExportError, ExportFetcher, HttpExportFetcher};
use serde_json::json;
use std::collections::HashMap;

/// Serve `router` on an ephemeral port and return its base URL
async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/export-data/api/v1", addr)
}

fn fetcher(base_url: String) -> HttpExportFetcher {
    HttpExportFetcher::from_config(&UpstreamConfig {
        base_url,
        api_token: "test-token".to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

async fn echo_export(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let authorized = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        == Some("Bearer test-token");
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }

    Json(json!([
        {
            "metricName": "Traffic",
            "information": [{
                "URL": "https://x.com/p",
                "numOfDays": params.get("numOfDays"),
                "dimension1": params.get("dimension1"),
                "dimension2": params.get("dimension2"),
                "dimension3": params.get("dimension3")
            }]
        }
    ]))
    .into_response()
}

#[tokio::test]
async fn test_fetch_sends_query_shape_and_token() {
    let base = spawn_upstream(Router::new().route(
        "/export-data/api/v1/project-live-insights",
        get(echo_export),
    ))
    .await;

    let blocks = fetcher(base)
        .fetch(&DimensionProfile::SourceMedium.query(2))
        .await
        .unwrap();

    assert_eq!(blocks.len(), 1);
    let row = &blocks[0].rows[0];
    assert_eq!(row["numOfDays"], "2");
    assert_eq!(row["dimension1"], "Source");
    assert_eq!(row["dimension2"], "Medium");
    assert_eq!(row["dimension3"], "URL");
}

#[tokio::test]
async fn test_error_status_carries_truncated_body() {
    let long_body = "x".repeat(2000);
    let base = spawn_upstream(Router::new().route(
        "/export-data/api/v1/project-live-insights",
        get(move || {
            let body = long_body.clone();
            async move { (StatusCode::TOO_MANY_REQUESTS, body) }
        }),
    ))
    .await;

    let err = fetcher(base)
        .fetch(&DimensionProfile::Url.query(1))
        .await
        .unwrap_err();

    match err {
        ExportError::Status { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body.len(), 512);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let base = spawn_upstream(Router::new().route(
        "/export-data/api/v1/project-live-insights",
        get(|| async { "<html>maintenance</html>" }),
    ))
    .await;

    let err = fetcher(base)
        .fetch(&DimensionProfile::Url.query(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_error() {
    // Bind and immediately drop a listener to get a port nobody serves
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetcher(format!("http://{}", addr))
        .fetch(&DimensionProfile::Url.query(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Transport(_)));
    assert_eq!(err.status(), None);
}
