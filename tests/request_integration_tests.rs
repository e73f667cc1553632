//! Integration Tests for the Request Helper
//!
//! Serves pages from a local axum origin and fetches them through the
//! cached requester.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use file_memo::request::{FailureLog, ResponseType, UserAgent};
use file_memo::{CachedValue, MemoError, RequestOptions, Requester};
use serde_json::{json, Value};
use tempfile::TempDir;

// == Helper Functions ==

#[derive(Clone, Default)]
struct Origin {
    hits: Arc<AtomicUsize>,
}

async fn page(State(origin): State<Origin>) -> String {
    let n = origin.hits.fetch_add(1, Ordering::SeqCst) + 1;
    format!("hello {n}")
}

async fn data(State(origin): State<Origin>) -> Json<Value> {
    origin.hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"items": [1, 2, 3], "ok": true}))
}

async fn echo_user_agent(headers: HeaderMap) -> String {
    headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn missing() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn spawn_origin() -> (SocketAddr, Origin) {
    let origin = Origin::default();
    let app = Router::new()
        .route("/page", get(page))
        .route("/data", get(data))
        .route("/ua", get(echo_user_agent))
        .route("/missing", get(missing))
        .with_state(origin.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, origin)
}

fn direct_options(dir: &Path) -> RequestOptions {
    RequestOptions {
        proxy_enabled: false,
        cache_folder: dir.join("request-cache"),
        logs_file: dir.join("request-errors.json"),
        ..RequestOptions::default()
    }
}

fn cache_files(dir: &Path) -> usize {
    std::fs::read_dir(dir.join("request-cache"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

// == Caching ==

#[tokio::test]
async fn test_request_is_cached() {
    let (addr, origin) = spawn_origin().await;
    let dir = TempDir::new().unwrap();
    let requester = Requester::new(false);
    let url = format!("http://{addr}/page");

    let first = requester.request(&url, direct_options(dir.path())).await.unwrap();
    let second = requester.request(&url, direct_options(dir.path())).await.unwrap();

    assert_eq!(first, CachedValue::Text("hello 1".to_string()));
    assert_eq!(second, first);
    assert_eq!(origin.hits.load(Ordering::SeqCst), 1);
    assert_eq!(cache_files(dir.path()), 1);
}

#[tokio::test]
async fn test_cache_disabled_always_fetches() {
    let (addr, origin) = spawn_origin().await;
    let dir = TempDir::new().unwrap();
    let requester = Requester::new(false);
    let url = format!("http://{addr}/page");
    let options = RequestOptions {
        cache_disabled: true,
        ..direct_options(dir.path())
    };

    requester.request(&url, options.clone()).await.unwrap();
    let second = requester.request(&url, options).await.unwrap();

    assert_eq!(second, CachedValue::Text("hello 2".to_string()));
    assert_eq!(origin.hits.load(Ordering::SeqCst), 2);
    assert_eq!(cache_files(dir.path()), 0);
}

#[tokio::test]
async fn test_production_mode_skips_cache() {
    let (addr, origin) = spawn_origin().await;
    let dir = TempDir::new().unwrap();
    let requester = Requester::new(true);
    let url = format!("http://{addr}/page");
    let options = RequestOptions {
        wait_ms: 10,
        ..direct_options(dir.path())
    };

    requester.request(&url, options.clone()).await.unwrap();
    requester.request(&url, options).await.unwrap();

    assert!(requester.is_production());
    assert_eq!(origin.hits.load(Ordering::SeqCst), 2);
    assert_eq!(cache_files(dir.path()), 0);
}

#[tokio::test]
async fn test_json_response_cached_as_text() {
    let (addr, origin) = spawn_origin().await;
    let dir = TempDir::new().unwrap();
    let requester = Requester::new(false);
    let url = format!("http://{addr}/data");
    let options = RequestOptions {
        response_type: ResponseType::Json,
        ..direct_options(dir.path())
    };

    let fetched = requester.fetch(&url, &options).await.unwrap();
    assert_eq!(fetched, json!({"items": [1, 2, 3], "ok": true}));

    let cached = requester.request(&url, options.clone()).await.unwrap();
    let again = requester.request(&url, options).await.unwrap();
    let parsed: Value = cached.deserialize().unwrap();

    assert_eq!(parsed, json!({"items": [1, 2, 3], "ok": true}));
    assert!(again.as_text().is_some());
    assert_eq!(origin.hits.load(Ordering::SeqCst), 2);
}

// == Headers and Proxies ==

#[tokio::test]
async fn test_sends_chrome_user_agent() {
    let (addr, _origin) = spawn_origin().await;
    let dir = TempDir::new().unwrap();
    let requester = Requester::default();

    let body = requester
        .fetch(&format!("http://{addr}/ua"), &direct_options(dir.path()))
        .await
        .unwrap();

    assert_eq!(body, Value::String(UserAgent::Chrome.as_str().to_string()));
}

#[tokio::test]
async fn test_custom_proxy_receives_request() {
    let (addr, origin) = spawn_origin().await;
    let dir = TempDir::new().unwrap();
    let requester = Requester::default();
    let options = RequestOptions {
        proxy_enabled: true,
        proxy_file: None,
        proxy_custom: Some(format!("http://{addr}")),
        ..direct_options(dir.path())
    };

    let body = requester
        .fetch("http://origin.invalid/page", &options)
        .await
        .unwrap();

    assert_eq!(body, Value::String("hello 1".to_string()));
    assert_eq!(origin.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_proxy_file_falls_back_to_last_line() {
    let (addr, origin) = spawn_origin().await;
    let dir = TempDir::new().unwrap();
    let proxy_file = dir.path().join("proxy.txt");
    std::fs::write(&proxy_file, format!("http://127.0.0.1:9\nhttp://{addr}\n")).unwrap();

    let requester = Requester::default();
    let options = RequestOptions {
        proxy_enabled: true,
        proxy_file: Some(proxy_file),
        proxy_id: 7,
        ..direct_options(dir.path())
    };

    let body = requester
        .fetch("http://origin.invalid/page", &options)
        .await
        .unwrap();

    assert_eq!(body, Value::String("hello 1".to_string()));
    assert_eq!(origin.hits.load(Ordering::SeqCst), 1);
}

// == Failures ==

#[tokio::test]
async fn test_http_error_logged_and_returned() {
    let (addr, _origin) = spawn_origin().await;
    let dir = TempDir::new().unwrap();
    let requester = Requester::new(false);
    let url = format!("http://{addr}/missing");
    let options = direct_options(dir.path());

    let err = requester.request(&url, options.clone()).await.unwrap_err();
    assert!(matches!(err, MemoError::HttpStatus { status: 404, .. }));
    assert_eq!(cache_files(dir.path()), 0);

    let records = FailureLog::new(&options.logs_file).read_all().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, url);
    assert_eq!(records[0].attempt, 1);
    assert!(records[0].err.contains("404"));
}

#[tokio::test]
async fn test_missing_proxy_is_not_logged() {
    let dir = TempDir::new().unwrap();
    let requester = Requester::new(false);
    let options = RequestOptions {
        proxy_enabled: true,
        proxy_file: None,
        proxy_custom: None,
        ..direct_options(dir.path())
    };

    let err = requester
        .request("http://origin.invalid/page", options.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, MemoError::MissingProxy));
    assert!(FailureLog::new(&options.logs_file)
        .read_all()
        .await
        .unwrap()
        .is_empty());
}
