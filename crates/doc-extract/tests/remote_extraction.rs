//! Extraction against mock Unstructured and web servers

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tempfile::TempDir;

use doc_extract::config::UnstructuredConfig;
use doc_extract::storage::{LocalStorage, StorageBackend};
use doc_extract::types::document::{META_PAGE, META_SOURCE};
use doc_extract::{Error, EtlType, ExtractProcessor, ExtractSetting};

#[derive(Clone, Default)]
struct Recorded {
    fields: Arc<Mutex<Vec<(String, String)>>>,
    api_key: Arc<Mutex<Option<String>>>,
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Partition endpoint that records text fields and answers with `elements`.
async fn mock_unstructured(elements: Value) -> (SocketAddr, Recorded) {
    let recorded = Recorded::default();

    let router = Router::new()
        .route(
            "/general/v0/general",
            post(
                move |State(recorded): State<Recorded>,
                      headers: HeaderMap,
                      mut multipart: Multipart| {
                    let elements = elements.clone();
                    async move {
                        *recorded.api_key.lock().unwrap() = headers
                            .get("unstructured-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);

                        while let Some(field) = multipart.next_field().await.unwrap() {
                            let name = field.name().unwrap_or_default().to_string();
                            let is_file = field.file_name().is_some();
                            let value = field.text().await.unwrap();
                            if !is_file {
                                recorded.fields.lock().unwrap().push((name, value));
                            }
                        }
                        Json(elements)
                    }
                },
            ),
        )
        .with_state(recorded.clone());

    (serve(router).await, recorded)
}

fn processor(api_url: Option<String>) -> (ExtractProcessor, TempDir) {
    let temp = TempDir::new().unwrap();
    let storage = LocalStorage::new(temp.path().to_string_lossy().to_string());
    let unstructured = UnstructuredConfig {
        api_url,
        api_key: Some("secret".to_string()),
    };
    let processor = ExtractProcessor::new(Arc::new(storage), unstructured).unwrap();
    (processor, temp)
}

#[tokio::test]
async fn xml_is_partitioned_and_chunked() {
    let mut elements = vec![json!({"type": "Title", "text": "Catalog"})];
    for i in 0..5 {
        elements.push(json!({
            "type": "NarrativeText",
            "text": format!("{} {}", i, "lorem ipsum ".repeat(75).trim()),
        }));
    }
    let (addr, recorded) = mock_unstructured(Value::Array(elements)).await;
    let (processor, _temp) = processor(Some(format!("http://{}/general/v0/general", addr)));

    processor
        .storage()
        .save("feeds/catalog.xml", Bytes::from("<catalog><item>x</item></catalog>"))
        .await
        .unwrap();

    let setting = ExtractSetting::for_key("feeds/catalog.xml").with_etl_type(EtlType::Unstructured);
    let docs = processor.extract(&setting, true).await.unwrap();

    assert!(docs.len() >= 3);
    assert!(docs[0].content.starts_with("Catalog"));
    for doc in &docs {
        assert!(doc.content.chars().count() <= 2000);
        assert!(doc.meta(META_SOURCE).unwrap().ends_with(".xml"));
    }

    let fields = recorded.fields.lock().unwrap().clone();
    assert!(fields.contains(&("xml_keep_tags".to_string(), "true".to_string())));
    assert_eq!(recorded.api_key.lock().unwrap().as_deref(), Some("secret"));
}

#[tokio::test]
async fn pptx_groups_elements_by_page() {
    let elements = json!([
        {"type": "Title", "text": "Slide one", "metadata": {"page_number": 1}},
        {"type": "ListItem", "text": "First point", "metadata": {"page_number": 1}},
        {"type": "Title", "text": "Slide two", "metadata": {"page_number": 2}},
    ]);
    let (addr, _recorded) = mock_unstructured(elements).await;
    let (processor, _temp) = processor(Some(format!("http://{}/general/v0/general", addr)));

    processor
        .storage()
        .save("deck.pptx", Bytes::from_static(b"PK\x03\x04"))
        .await
        .unwrap();

    let setting = ExtractSetting::for_key("deck.pptx").with_etl_type(EtlType::Unstructured);
    let docs = processor.extract(&setting, true).await.unwrap();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].content, "Slide one\nFirst point");
    assert_eq!(docs[0].meta(META_PAGE), Some("1"));
    assert_eq!(docs[1].content, "Slide two");
    assert_eq!(docs[1].meta(META_PAGE), Some("2"));
}

#[tokio::test]
async fn service_failure_is_remote_error() {
    let router = Router::new().route(
        "/general/v0/general",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "partition failed") }),
    );
    let addr = serve(router).await;
    let (processor, _temp) = processor(Some(format!("http://{}/general/v0/general", addr)));

    processor
        .storage()
        .save("notes.md", Bytes::from("# Notes\nbody"))
        .await
        .unwrap();

    let setting = ExtractSetting::for_key("notes.md").with_etl_type(EtlType::Unstructured);
    let err = processor.extract(&setting, true).await.unwrap_err();
    match err {
        Error::RemoteService(message) => assert!(message.contains("500")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn url_is_fetched_and_extracted() {
    let router = Router::new()
        .route(
            "/pages/about.html",
            get(|| async {
                axum::response::Html(
                    "<html><head><title>t</title><script>var x = 1;</script></head>\
                     <body><h1>About</h1><p>We extract text.</p></body></html>",
                )
            }),
        )
        .route("/report.csv", get(|| async { "name,score\nada,3\n" }));
    let addr = serve(router).await;
    let (processor, _temp) = processor(None);

    let docs = processor
        .load_from_url(&format!("http://{}/pages/about.html?ref=home#top", addr), false)
        .await
        .unwrap()
        .into_documents()
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].content, "About\nWe extract text.");

    let text = processor
        .load_from_url(&format!("http://{}/report.csv", addr), true)
        .await
        .unwrap()
        .into_text();
    assert_eq!(text, "name: ada\nscore: 3");
}

#[tokio::test]
async fn url_error_status_is_fetch_error() {
    let addr = serve(Router::new()).await;
    let (processor, _temp) = processor(None);

    let err = processor
        .load_from_url(&format!("http://{}/missing.txt", addr), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NetworkFetch { .. }));
}
