use super::*;
use crate::downloader::test_helpers::{ScriptedFetcher, create_test_downloader, test_config};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;


/// Router over a scripted downloader, returning the downloader and fetcher for inspection
fn test_app(
    config: Config,
    fetcher: ScriptedFetcher,
) -> (Router, Arc<BatchDownloader>, Arc<ScriptedFetcher>) {
    let (downloader, fetcher) = create_test_downloader(config, fetcher);
    let config = Arc::clone(downloader.config());
    let app = create_router(Arc::clone(&downloader), config);
    (app, downloader, fetcher)
}

fn post_json(body: impl Into<String>) -> Request<Body> {
    let body = body.into();
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap()
}

/// Send a request and decode the JSON response body
async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn test_api_server_serves_and_stops_on_shutdown() {
    let (downloader, _) = create_test_downloader(
        test_config(),
        ScriptedFetcher::new().body("http://up/a", "A"),
    );

    let mut config = (**downloader.config()).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let listener = TcpListener::bind(config.api.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn({
        let downloader = Arc::clone(&downloader);
        let shutdown = {
            let downloader = Arc::clone(&downloader);
            async move { downloader.shutdown_requested().await }
        };
        serve(listener, downloader, config, shutdown)
    });

    let response = reqwest::Client::new()
        .post(format!("http://{}/", addr))
        .body(r#"{"urls":["http://up/a"]}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"][0]["result"], "A");

    downloader.shutdown().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop after shutdown")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_start_api_server_reports_bind_failure() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = test_config();
    config.api.bind_address = occupied.local_addr().unwrap();

    let (downloader, _) = create_test_downloader(config, ScriptedFetcher::new());
    let config = Arc::clone(downloader.config());

    let result = start_api_server(downloader, config).await;
    assert!(matches!(result, Err(crate::Error::Io(_))));
}

#[tokio::test]
async fn test_cors_enabled() {
    let mut config = test_config();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let (app, _, _) = test_app(config, ScriptedFetcher::new());

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let mut config = test_config();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["http://allowed.example".to_string()];
    let (app, _, _) = test_app(config, ScriptedFetcher::new());

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://allowed.example"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (app, _, _) = test_app(test_config(), ScriptedFetcher::new());

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}
