//! HTTP surface of the extraction server

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use doc_extract::server::ExtractServer;
use doc_extract::storage::{self, StorageConfig};
use doc_extract::AppConfig;

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn url_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/extractor/url")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn extract_url_endpoint() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let site = Router::new().route("/readme.md", get(|| async { "# Readme\nInstall it.\n" }));
    tokio::spawn(async move {
        axum::serve(listener, site).await.unwrap();
    });

    let temp = TempDir::new().unwrap();
    let config = AppConfig {
        storage: StorageConfig::local(temp.path().to_string_lossy()),
        ..AppConfig::default()
    };
    let backend = storage::create_storage(&config.storage).unwrap();
    let server = ExtractServer::new(config, backend).unwrap();

    let response = server
        .router()
        .oneshot(url_request(format!("url=http%3A%2F%2F{}%2Freadme.md", addr)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let documents = json["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["content"], "Readme\nInstall it.");
}

#[tokio::test]
async fn unreachable_url_is_bad_gateway() {
    let temp = TempDir::new().unwrap();
    let backend = Arc::new(storage::LocalStorage::new(temp.path().to_string_lossy()));
    let server = ExtractServer::new(AppConfig::default(), backend).unwrap();

    let response = server
        .router()
        .oneshot(url_request("url=http%3A%2F%2F127.0.0.1%3A1%2Fdoc.txt".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(json_body(response).await["error"].is_string());
}
