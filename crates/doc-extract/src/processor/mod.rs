//! Extraction dispatcher
//!
//! Resolves a source (storage key, URL or local path) to a file on disk,
//! picks an extractor from the routing table and runs it. Materialized
//! inputs live in a [`ScopedTempFile`] and are removed on every exit path.

pub mod routing;
pub mod temp;

pub use routing::{extension_of, select, select_for_path, ExtractorKind};
pub use temp::ScopedTempFile;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::config::UnstructuredConfig;
use crate::error::{Error, Result};
use crate::extractor::{
    CsvExtractor, ExcelExtractor, Extractor, HtmlExtractor, MarkdownExtractor, PdfExtractor,
    RemoteExtractor, TextExtractor, UnstructuredClient, WordExtractor,
};
use crate::storage::StorageBackend;
use crate::types::document::join_contents;
use crate::types::{Document, ExtractSetting};

/// Browser-like user agent sent when fetching URLs
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Extraction result in the shape the caller asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Documents(Vec<Document>),
    /// Document contents joined with `\n`
    Text(String),
}

impl Extracted {
    fn from_documents(documents: Vec<Document>, return_text: bool) -> Self {
        if return_text {
            Extracted::Text(join_contents(&documents))
        } else {
            Extracted::Documents(documents)
        }
    }

    /// Documents, if this is the document form
    pub fn into_documents(self) -> Option<Vec<Document>> {
        match self {
            Extracted::Documents(docs) => Some(docs),
            Extracted::Text(_) => None,
        }
    }

    /// Plain text of either form
    pub fn into_text(self) -> String {
        match self {
            Extracted::Documents(docs) => join_contents(&docs),
            Extracted::Text(text) => text,
        }
    }
}

/// Dispatches extraction requests to format-specific extractors.
pub struct ExtractProcessor {
    storage: Arc<dyn StorageBackend>,
    http: reqwest::Client,
    unstructured: UnstructuredConfig,
    temp_root: Option<PathBuf>,
}

impl ExtractProcessor {
    /// Create a processor over a storage backend.
    pub fn new(storage: Arc<dyn StorageBackend>, unstructured: UnstructuredConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            storage,
            http,
            unstructured,
            temp_root: None,
        })
    }

    /// Create materialized inputs under `root` instead of the system temp dir.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    fn scoped_temp(&self, suffix: &str) -> Result<ScopedTempFile> {
        match self.temp_root {
            Some(ref root) => ScopedTempFile::new_in(root, suffix),
            None => ScopedTempFile::new(suffix),
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    pub fn unstructured(&self) -> &UnstructuredConfig {
        &self.unstructured
    }

    /// Build the extractor for a routing decision.
    ///
    /// Remote variants need `unstructured.api_url`; without it they fail
    /// with `RemoteService`.
    pub fn build_extractor(&self, kind: ExtractorKind) -> Result<Box<dyn Extractor>> {
        let extractor: Box<dyn Extractor> = match kind {
            ExtractorKind::Spreadsheet => Box::new(ExcelExtractor::new()),
            ExtractorKind::Pdf => Box::new(PdfExtractor::new()),
            ExtractorKind::Markdown => Box::new(MarkdownExtractor::new(true)),
            ExtractorKind::Html => Box::new(HtmlExtractor::new()),
            ExtractorKind::Word => Box::new(WordExtractor::new()),
            ExtractorKind::Csv => Box::new(CsvExtractor::new(true)),
            ExtractorKind::Text => Box::new(TextExtractor::new(true)),
            ExtractorKind::Remote(format) => {
                let api_url = self
                    .unstructured
                    .api_url
                    .as_deref()
                    .filter(|url| !url.is_empty())
                    .ok_or_else(|| {
                        Error::remote(format!(
                            "{} requires UNSTRUCTURED_API_URL to be configured",
                            format.name()
                        ))
                    })?;
                let client = UnstructuredClient::new(
                    self.http.clone(),
                    api_url,
                    self.unstructured.api_key.clone(),
                );
                Box::new(RemoteExtractor::new(client, format))
            }
        };
        Ok(extractor)
    }

    /// Extract the file named by `setting.filepath` from storage.
    pub async fn extract(&self, setting: &ExtractSetting, automatic: bool) -> Result<Vec<Document>> {
        let key = setting
            .filepath
            .as_deref()
            .ok_or_else(|| Error::internal("extract setting has no filepath"))?;

        let temp = self.scoped_temp(&temp::suffix_of_key(key))?;
        debug!("Downloading {} to {:?}", key, temp.path());
        self.storage.download(key, temp.path()).await?;

        // Report parse failures against the key, not the temp file name.
        self.extract_path(setting, automatic, temp.path())
            .await
            .map_err(|e| match e {
                Error::FileParse { message, .. } => Error::file_parse(key, message),
                other => other,
            })
    }

    /// Extract an already-local file. The file is never modified.
    #[instrument(skip(self, setting), fields(etl_type = ?setting.etl_type))]
    pub async fn extract_path(
        &self,
        setting: &ExtractSetting,
        automatic: bool,
        path: &Path,
    ) -> Result<Vec<Document>> {
        let kind = select_for_path(path, setting.etl_type, automatic);
        let extractor = self.build_extractor(kind)?;

        let start = Instant::now();
        let documents = extractor.extract(path).await?;
        info!(
            "Extracted {} documents with {} in {}ms",
            documents.len(),
            extractor.name(),
            start.elapsed().as_millis()
        );

        Ok(documents)
    }

    /// Extract a stored file in default mode.
    pub async fn load_from_file(
        &self,
        key: &str,
        return_text: bool,
        automatic: bool,
    ) -> Result<Extracted> {
        let documents = self.extract(&ExtractSetting::for_key(key), automatic).await?;
        Ok(Extracted::from_documents(documents, return_text))
    }

    /// Fetch a URL and extract it in default mode.
    ///
    /// The file suffix comes from the URL path; query and fragment are ignored.
    #[instrument(skip(self))]
    pub async fn load_from_url(&self, url: &str, return_text: bool) -> Result<Extracted> {
        let parsed = reqwest::Url::parse(url).map_err(|e| Error::fetch(url, e.to_string()))?;

        let response = self
            .http
            .get(parsed.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::fetch(url, e.to_string()))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::fetch(url, e.to_string()))?;
        debug!("Fetched {} bytes from {}", body.len(), url);

        let temp = self.scoped_temp(&temp::suffix_of_url(&parsed))?;
        tokio::fs::write(temp.path(), &body).await?;

        let documents = self
            .extract_path(&ExtractSetting::default(), false, temp.path())
            .await?;
        Ok(Extracted::from_documents(documents, return_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::RemoteFormat;
    use crate::storage::{LocalStorage, StorageBackend};
    use crate::types::document::{META_ROW, META_SOURCE};
    use crate::types::EtlType;
    use bytes::Bytes;
    use tempfile::TempDir;

    fn processor() -> (ExtractProcessor, TempDir) {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path().to_string_lossy().to_string());
        let processor = ExtractProcessor::new(Arc::new(storage), UnstructuredConfig::default()).unwrap();
        (processor, temp)
    }

    #[tokio::test]
    async fn test_load_from_file_text_scenario() {
        let (processor, _temp) = processor();
        processor
            .storage()
            .save("docs/x.txt", Bytes::from("hello\nworld"))
            .await
            .unwrap();

        let docs = processor
            .load_from_file("docs/x.txt", false, false)
            .await
            .unwrap()
            .into_documents()
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "hello\nworld");

        let text = processor.load_from_file("docs/x.txt", true, false).await.unwrap();
        assert_eq!(text, Extracted::Text("hello\nworld".to_string()));
    }

    #[tokio::test]
    async fn test_return_text_joins_rows() {
        let (processor, _temp) = processor();
        processor
            .storage()
            .save("t.csv", Bytes::from("k,v\na,1\nb,2\n"))
            .await
            .unwrap();

        let text = processor.load_from_file("t.csv", true, false).await.unwrap();
        assert_eq!(text.into_text(), "k: a\nv: 1\nk: b\nv: 2");
    }

    #[tokio::test]
    async fn test_missing_key_propagates_not_found() {
        let (processor, _temp) = processor();
        let err = processor
            .load_from_file("docs/missing.txt", false, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_extension_routing_is_case_insensitive() {
        let (processor, _temp) = processor();
        processor
            .storage()
            .save("sheet.CSV", Bytes::from("a,b\n1,2\n"))
            .await
            .unwrap();

        let docs = processor
            .extract(&ExtractSetting::for_key("sheet.CSV"), false)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].meta(META_ROW), Some("0"));
    }

    #[tokio::test]
    async fn test_extract_path_leaves_input() {
        let (processor, temp) = processor();
        let path = temp.path().join("local.md");
        std::fs::write(&path, "# Title\nbody\n").unwrap();

        let docs = processor
            .extract_path(&ExtractSetting::default(), false, &path)
            .await
            .unwrap();
        assert_eq!(docs[0].content, "Title\nbody");
        assert_eq!(docs[0].meta(META_SOURCE), Some(path.display().to_string().as_str()));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_unstructured_without_automatic_stays_local() {
        let (processor, _temp) = processor();
        processor
            .storage()
            .save("mail.eml", Bytes::from("Subject: hi\n\nbody"))
            .await
            .unwrap();

        // No partition service configured, so a remote route would fail.
        let setting = ExtractSetting::for_key("mail.eml").with_etl_type(EtlType::Unstructured);
        let docs = processor.extract(&setting, false).await.unwrap();
        assert_eq!(docs[0].content, "Subject: hi\n\nbody");
    }

    #[tokio::test]
    async fn test_remote_route_requires_api_url() {
        let (processor, _temp) = processor();
        let result = processor.build_extractor(ExtractorKind::Remote(RemoteFormat::Xml));
        assert!(matches!(result, Err(Error::RemoteService(_))));
    }

    #[tokio::test]
    async fn test_build_extractor_names() {
        let (processor, _temp) = processor();
        assert_eq!(processor.build_extractor(ExtractorKind::Pdf).unwrap().name(), "pdf");
        assert_eq!(processor.build_extractor(ExtractorKind::Text).unwrap().name(), "text");
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let (processor, _temp) = processor();
        let err = processor.load_from_url("not a url", false).await.unwrap_err();
        assert!(matches!(err, Error::NetworkFetch { .. }));
    }

    #[tokio::test]
    async fn test_missing_filepath() {
        let (processor, _temp) = processor();
        let err = processor.extract(&ExtractSetting::default(), false).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test]
    async fn test_parse_error_names_storage_key() {
        let (processor, _temp) = processor();
        processor
            .storage()
            .save("reports/q3.pdf", Bytes::from("not a pdf"))
            .await
            .unwrap();

        let err = processor.load_from_file("reports/q3.pdf", false, false).await.unwrap_err();
        match err {
            Error::FileParse { filename, .. } => assert_eq!(filename, "reports/q3.pdf"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_temp_dir_released_when_extractor_fails() {
        let (processor, _store) = processor();
        let scratch = TempDir::new().unwrap();
        let processor = processor.with_temp_root(scratch.path());
        processor
            .storage()
            .save("broken.pdf", Bytes::from("%PDF-1.4 truncated"))
            .await
            .unwrap();

        assert!(processor.load_from_file("broken.pdf", false, false).await.is_err());
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
