//! HTML extractor

use async_trait::async_trait;
use scraper::{Html, Node};
use std::path::Path;

use super::{display_name, encoding, read_input, run_blocking, source_of, Extractor};
use crate::error::Result;
use crate::types::document::{Document, META_SOURCE};

/// Elements whose text never renders
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Visible text of an HTML document or fragment.
///
/// Text nodes are trimmed and joined with newlines; empty nodes are dropped.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => HIDDEN_ELEMENTS.contains(&element.name()),
            _ => false,
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join("\n")
}

/// Whole page as one document.
#[derive(Debug, Clone, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for HtmlExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<Document>> {
        let bytes = read_input(path).await?;
        let html = encoding::decode(&bytes, true, &display_name(path))?;
        let text = run_blocking(move || Ok(visible_text(&html))).await?;

        Ok(vec![Document::new(text).with_meta(META_SOURCE, source_of(path))])
    }

    fn name(&self) -> &'static str {
        "html"
    }
}
