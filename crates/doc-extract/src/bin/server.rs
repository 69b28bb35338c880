//! Extraction server binary
//!
//! Run with: cargo run -p doc-extract --bin doc-extract-server

use doc_extract::{config::AppConfig, server::ExtractServer, storage};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_extract=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Storage: {:?}", config.storage);
    tracing::info!(
        "  - Unstructured API: {}",
        config.unstructured.api_url.as_deref().unwrap_or("not configured")
    );
    tracing::info!("  - Max upload size: {} bytes", config.server.max_upload_size);

    let backend = storage::init(&config.storage)?;
    let server = ExtractServer::new(config, backend)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /extractor/file - Extract an uploaded file");
    println!("  POST /extractor/url  - Extract a web page or remote file");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
