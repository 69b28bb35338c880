//! Remote extraction through an Unstructured-compatible partition API
//!
//! The service receives the file as multipart field `files` and answers with
//! a JSON array of elements:
//!
//! ```json
//! [{"type": "Title", "text": "Intro", "metadata": {"page_number": 1}}]
//! ```

pub mod chunking;

pub use chunking::TitleChunker;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, instrument};

use super::{display_name, html, read_input, source_of, Extractor};
use crate::error::{Error, Result};
use crate::types::document::{Document, META_PAGE, META_SOURCE};

/// Largest chunk produced by title chunking
pub const MAX_CHUNK_CHARACTERS: usize = 2000;
/// Default merge threshold for small title sections
pub const COMBINE_UNDER_CHARACTERS: usize = 2000;

const API_KEY_HEADER: &str = "unstructured-api-key";

/// One partitioned element
#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    #[serde(rename = "type", default)]
    pub element_type: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub metadata: ElementMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementMetadata {
    #[serde(default)]
    pub page_number: Option<u32>,
}

/// HTTP client for the partition endpoint.
#[derive(Debug, Clone)]
pub struct UnstructuredClient {
    http: Client,
    api_url: String,
    api_key: Option<String>,
}

impl UnstructuredClient {
    pub fn new(http: Client, api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Partition a local file into elements.
    ///
    /// Transport failures, non-2xx answers and undecodable bodies are all
    /// reported as `RemoteService`.
    #[instrument(skip(self, extra_fields), fields(url = %self.api_url))]
    pub async fn partition(&self, path: &Path, extra_fields: &[(&str, &str)]) -> Result<Vec<Element>> {
        let data = read_input(path).await?;
        let filename = display_name(path);
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        debug!("Partitioning {} ({} bytes, {})", filename, data.len(), mime);

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename)
            .mime_str(mime.essence_str())
            .map_err(|e| Error::remote(format!("Invalid content type: {}", e)))?;

        let mut form = reqwest::multipart::Form::new().part("files", part);
        for (name, value) in extra_fields {
            form = form.text(name.to_string(), value.to_string());
        }

        let mut request = self.http.post(&self.api_url).multipart(form);
        if let Some(ref api_key) = self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::remote(format!("Unstructured API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::remote(format!("Unstructured API error: {} - {}", status, body)));
        }

        let elements: Vec<Element> = response
            .json()
            .await
            .map_err(|e| Error::remote(format!("Failed to parse Unstructured response: {}", e)))?;

        debug!("Received {} elements", elements.len());
        Ok(elements)
    }
}

/// Input formats handled by the partition service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteFormat {
    Markdown,
    Word,
    Msg,
    Eml,
    Ppt,
    Pptx,
    Xml,
    Text,
}

impl RemoteFormat {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteFormat::Markdown => "unstructured_markdown",
            RemoteFormat::Word => "unstructured_word",
            RemoteFormat::Msg => "unstructured_msg",
            RemoteFormat::Eml => "unstructured_eml",
            RemoteFormat::Ppt => "unstructured_ppt",
            RemoteFormat::Pptx => "unstructured_pptx",
            RemoteFormat::Xml => "unstructured_xml",
            RemoteFormat::Text => "unstructured_text",
        }
    }

    /// Extra form fields sent with the partition request
    fn form_fields(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            RemoteFormat::Xml => &[("xml_keep_tags", "true")],
            _ => &[],
        }
    }

    fn groups_by_page(&self) -> bool {
        matches!(self, RemoteFormat::Ppt | RemoteFormat::Pptx)
    }

    fn chunker(&self) -> TitleChunker {
        match self {
            RemoteFormat::Xml => TitleChunker::new(MAX_CHUNK_CHARACTERS, 0),
            _ => TitleChunker::new(MAX_CHUNK_CHARACTERS, COMBINE_UNDER_CHARACTERS),
        }
    }
}

/// Email bodies often come back base64 encoded HTML. Decode when possible,
/// otherwise keep the text as is.
pub fn decode_email_text(text: &str) -> String {
    let trimmed = text.trim();
    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return text.to_string();
    }

    let padding = (4 - compact.len() % 4) % 4;
    let padded = format!("{}{}", compact, "=".repeat(padding));

    match base64::engine::general_purpose::STANDARD.decode(padded.as_bytes()) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(decoded) => html::visible_text(&decoded),
            Err(_) => text.to_string(),
        },
        Err(_) => text.to_string(),
    }
}

/// Collect element text per page, in first-seen page order.
pub fn group_by_page(elements: &[Element]) -> Vec<(Option<u32>, String)> {
    let mut pages: Vec<(Option<u32>, String)> = Vec::new();

    for element in elements {
        let page = element.metadata.page_number;
        match pages.iter_mut().find(|(p, _)| *p == page) {
            Some((_, text)) => {
                text.push('\n');
                text.push_str(&element.text);
            }
            None => pages.push((page, element.text.clone())),
        }
    }

    pages
        .into_iter()
        .map(|(page, text)| (page, text.trim().to_string()))
        .collect()
}

/// Remote variant for one input format.
#[derive(Debug, Clone)]
pub struct RemoteExtractor {
    client: UnstructuredClient,
    format: RemoteFormat,
}

impl RemoteExtractor {
    pub fn new(client: UnstructuredClient, format: RemoteFormat) -> Self {
        Self { client, format }
    }

    pub fn format(&self) -> RemoteFormat {
        self.format
    }

    fn documents(&self, mut elements: Vec<Element>, source: &str) -> Vec<Document> {
        if self.format == RemoteFormat::Eml {
            for element in &mut elements {
                element.text = decode_email_text(&element.text);
            }
        }

        if self.format.groups_by_page() {
            return group_by_page(&elements)
                .into_iter()
                .map(|(page, text)| {
                    let doc = Document::new(text).with_meta(META_SOURCE, source);
                    match page {
                        Some(page) => doc.with_meta(META_PAGE, page),
                        None => doc,
                    }
                })
                .collect();
        }

        self.format
            .chunker()
            .chunk(&elements)
            .into_iter()
            .map(|chunk| Document::new(chunk.trim()).with_meta(META_SOURCE, source))
            .collect()
    }
}

#[async_trait]
impl Extractor for RemoteExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<Document>> {
        let elements = self.client.partition(path, self.format.form_fields()).await?;
        Ok(self.documents(elements, &source_of(path)))
    }

    fn name(&self) -> &'static str {
        self.format.name()
    }
}
