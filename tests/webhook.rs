mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{StatusCode, header};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use abion_dns_webhook::config::AppConfig;
use abion_dns_webhook::webhook::{MEDIA_TYPE, create_router};
use abion_dns_webhook::{AppState, SharedState};

use common::{FakeStore, provider, rec};

async fn serve(store: &Arc<FakeStore>) -> SocketAddr {
    serve_with(store, false).await
}

async fn serve_with(store: &Arc<FakeStore>, dry_run: bool) -> SocketAddr {
    let state: SharedState = Arc::new(AppState {
        config: AppConfig {
            dry_run,
            ..AppConfig::default()
        },
        provider: provider(store, dry_run),
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    addr
}

fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}

#[tokio::test]
async fn negotiation_reports_domain_filter() {
    let store = Arc::new(FakeStore::new());
    let addr = serve(&store).await;

    let res = reqwest::get(url(addr, "/")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], MEDIA_TYPE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"include": ["abion.test"]}));
}

#[tokio::test]
async fn records_lists_zone_content() {
    let store = Arc::new(FakeStore::new().with_zone("abion.test", &[("www", "CNAME", &["target.abion.test."])]));
    let addr = serve(&store).await;

    let res = reqwest::get(url(addr, "/records")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!([{"dnsName": "www.abion.test", "targets": ["target.abion.test."], "recordType": "CNAME"}])
    );
}

#[tokio::test]
async fn posted_changes_are_applied() {
    let store = Arc::new(FakeStore::new().with_zone("abion.test", &[("@", "TXT", &["v1"])]));
    let addr = serve(&store).await;

    let res = reqwest::Client::new()
        .post(url(addr, "/records"))
        .header(header::CONTENT_TYPE, MEDIA_TYPE)
        .body(
            json!({
                "Create": [{"dnsName": "abion.test", "targets": ["v2"], "recordType": "TXT"}],
                "UpdateOld": null,
                "UpdateNew": null,
                "Delete": null
            })
            .to_string(),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.group("abion.test", "@", "TXT"), Some(vec![rec("v2"), rec("v1")]));
}

#[tokio::test]
async fn dry_run_accepts_changes_without_patching() {
    let store = Arc::new(FakeStore::new().with_zone("abion.test", &[("@", "TXT", &["v1"])]));
    let addr = serve_with(&store, true).await;

    let res = reqwest::Client::new()
        .post(url(addr, "/records"))
        .header(header::CONTENT_TYPE, MEDIA_TYPE)
        .body(json!({"Create": [{"dnsName": "abion.test", "targets": ["v2"], "recordType": "TXT"}]}).to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(store.patches().is_empty());
    assert_eq!(store.fetches(), vec!["abion.test".to_string()]);
    assert_eq!(store.group("abion.test", "@", "TXT"), Some(vec![rec("v1")]));
}

#[tokio::test]
async fn malformed_changes_are_rejected() {
    let store = Arc::new(FakeStore::new().with_zone("abion.test", &[]));
    let addr = serve(&store).await;

    let res = reqwest::Client::new()
        .post(url(addr, "/records"))
        .header(header::CONTENT_TYPE, MEDIA_TYPE)
        .body(r#"{"Create": [{"dnsName": "abion.test", "recordType": "BOGUS"}]}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());
    assert!(store.patches().is_empty());
}

#[tokio::test]
async fn reconciliation_failure_maps_to_server_error() {
    let store = Arc::new(
        FakeStore::new()
            .with_zone("abion.test", &[])
            .failing_patch("abion.test"),
    );
    let addr = serve(&store).await;

    let res = reqwest::Client::new()
        .post(url(addr, "/records"))
        .header(header::CONTENT_TYPE, MEDIA_TYPE)
        .body(json!({"Create": [{"dnsName": "www.abion.test", "targets": ["10.0.0.1"], "recordType": "A"}]}).to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("abion.test"));
}

#[tokio::test]
async fn adjust_endpoints_passes_through() {
    let store = Arc::new(FakeStore::new());
    let addr = serve(&store).await;
    let endpoints = json!([{"dnsName": "www.abion.test", "targets": ["10.0.0.1"], "recordType": "A", "recordTTL": 300}]);

    let res = reqwest::Client::new()
        .post(url(addr, "/adjustendpoints"))
        .header(header::CONTENT_TYPE, MEDIA_TYPE)
        .body(endpoints.to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], MEDIA_TYPE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, endpoints);
}

#[tokio::test]
async fn healthz_answers_ok() {
    let store = Arc::new(FakeStore::new());
    let addr = serve(&store).await;

    let res = reqwest::get(url(addr, "/healthz")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ok");
}
