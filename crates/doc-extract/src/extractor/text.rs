//! Plain text extractor

use async_trait::async_trait;
use std::path::Path;

use super::{display_name, encoding, read_input, source_of, Extractor};
use crate::error::Result;
use crate::types::document::{Document, META_SOURCE};

/// Whole file as a single document.
///
/// Also the fallback for any extension without a dedicated variant.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    autodetect_encoding: bool,
}

impl TextExtractor {
    pub fn new(autodetect_encoding: bool) -> Self {
        Self { autodetect_encoding }
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Extractor for TextExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<Document>> {
        let bytes = read_input(path).await?;
        let text = encoding::decode(&bytes, self.autodetect_encoding, &display_name(path))?;

        Ok(vec![Document::new(text).with_meta(META_SOURCE, source_of(path))])
    }

    fn name(&self) -> &'static str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_whole_file_one_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.log");
        std::fs::write(&path, "line one\nline two\n").unwrap();

        let docs = TextExtractor::default().extract(&path).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "line one\nline two\n");
        assert_eq!(docs[0].meta(META_SOURCE), Some(path.display().to_string().as_str()));
    }

    #[tokio::test]
    async fn test_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();

        let docs = TextExtractor::default().extract(&path).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].content.is_empty());
    }

    #[tokio::test]
    async fn test_input_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        std::fs::write(&path, b"abc").unwrap();

        TextExtractor::default().extract(&path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }
}
