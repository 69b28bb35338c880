//! Extraction endpoints

use axum::{
    extract::{Multipart, State},
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::processor::ScopedTempFile;
use crate::server::state::AppState;
use crate::types::{Document, ExtractSetting};

/// Response body of both endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub documents: Vec<Document>,
}

/// Form body of `POST /extractor/url`
#[derive(Debug, Default, Deserialize)]
pub struct UrlForm {
    pub url: Option<String>,
}

/// POST /extractor/file - extract an uploaded file (multipart field `file`)
pub async fn extract_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_request(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        if filename.is_empty() {
            return Err(Error::invalid_request("No selected file"));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::invalid_request(format!("Failed to read file: {}", e)))?;
        tracing::info!("Extracting uploaded file: {} ({} bytes)", filename, data.len());

        let temp = ScopedTempFile::named(&filename)?;
        tokio::fs::write(temp.path(), &data).await?;

        let documents = state
            .processor()
            .extract_path(&ExtractSetting::default(), false, temp.path())
            .await?;

        return Ok(Json(ExtractResponse { documents }));
    }

    Err(Error::invalid_request("No file part"))
}

/// POST /extractor/url - fetch and extract a URL (form field `url`)
pub async fn extract_url(
    State(state): State<AppState>,
    form: Option<Form<UrlForm>>,
) -> Result<Json<ExtractResponse>> {
    let url = form
        .and_then(|Form(form)| form.url)
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| Error::invalid_request("No url provided"))?;

    tracing::info!("Extracting URL: {}", url);
    let documents = state
        .processor()
        .load_from_url(&url, false)
        .await?
        .into_documents()
        .unwrap_or_default();

    Ok(Json(ExtractResponse { documents }))
}
