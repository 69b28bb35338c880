//! API routes for the extraction server

pub mod extractor;

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::server::state::AppState;

/// Build the extractor routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/extractor/file",
            post(extractor::extract_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/extractor/url", post(extractor::extract_url))
}
