//! Normalized extraction output

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata key holding the path the document was extracted from
pub const META_SOURCE: &str = "source";
/// Metadata key holding a 1-indexed page or slide number
pub const META_PAGE: &str = "page";
/// Metadata key holding a 0-indexed data row
pub const META_ROW: &str = "row";
/// Metadata key holding a spreadsheet sheet name
pub const META_SHEET: &str = "sheet";

/// A unit of extracted text plus string metadata.
///
/// `content` is always decoded text. Documents are produced by an extractor
/// and handed to the caller unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Extracted text
    pub content: String,
    /// Source, page, row and similar annotations
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with no metadata
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Add a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }

    /// Look up a metadata entry
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Join document contents with a newline, the plain-text form of an extraction
pub fn join_contents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_serializes_content_and_metadata() {
        let doc = Document::new("hello").with_meta(META_SOURCE, "/tmp/a.txt");
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["content"], "hello");
        assert_eq!(value["metadata"]["source"], "/tmp/a.txt");
    }

    #[test]
    fn test_with_meta_numbers() {
        let doc = Document::new("row").with_meta(META_ROW, 3);
        assert_eq!(doc.meta(META_ROW), Some("3"));
        assert_eq!(doc.meta(META_PAGE), None);
    }

    #[test]
    fn test_join_contents() {
        let docs = vec![Document::new("a"), Document::new("b"), Document::new("")];
        assert_eq!(join_contents(&docs), "a\nb\n");
        assert_eq!(join_contents(&[]), "");
    }
}
