//! Markdown extractor, one document per heading section

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use super::{display_name, encoding, read_input, source_of, Extractor};
use crate::error::Result;
use crate::types::document::{Document, META_SOURCE};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#+\s").expect("valid heading regex"));
static INLINE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("valid tag regex"));

/// A heading and the lines under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading text without the leading `#`s; `None` for text before the first heading
    pub heading: Option<String>,
    pub body: String,
}

/// Split markdown into heading sections.
///
/// Text before the first heading becomes its own untitled section.
pub fn split_sections(markdown: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut heading: Option<String> = None;
    let mut body = String::new();

    for line in markdown.lines() {
        if HEADING.is_match(line) {
            if heading.is_some() || !body.trim().is_empty() {
                sections.push(Section {
                    heading: heading.take(),
                    body: std::mem::take(&mut body),
                });
            }
            heading = Some(line.trim_start_matches('#').trim().to_string());
            body.clear();
        } else {
            body.push_str(line);
            body.push('\n');
        }
    }

    if heading.is_some() || !body.trim().is_empty() {
        sections.push(Section { heading, body });
    }

    sections
}

fn section_content(section: &Section) -> String {
    let body = INLINE_TAG.replace_all(&section.body, "");
    match &section.heading {
        Some(heading) => format!("{}\n{}", heading, body.trim()).trim().to_string(),
        None => body.trim().to_string(),
    }
}

/// Markdown file split at headings.
#[derive(Debug, Clone)]
pub struct MarkdownExtractor {
    autodetect_encoding: bool,
}

impl MarkdownExtractor {
    pub fn new(autodetect_encoding: bool) -> Self {
        Self { autodetect_encoding }
    }
}

impl Default for MarkdownExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Extractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<Document>> {
        let bytes = read_input(path).await?;
        let text = encoding::decode(&bytes, self.autodetect_encoding, &display_name(path))?;
        let source = source_of(path);

        Ok(split_sections(&text)
            .iter()
            .map(section_content)
            .filter(|content| !content.is_empty())
            .map(|content| Document::new(content).with_meta(META_SOURCE, &source))
            .collect())
    }

    fn name(&self) -> &'static str {
        "markdown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_sections() {
        let md = "intro line\n# One\nalpha\n## Two\nbeta\ngamma\n";
        let sections = split_sections(md);

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].heading, None);
        assert_eq!(sections[0].body, "intro line\n");
        assert_eq!(sections[1].heading.as_deref(), Some("One"));
        assert_eq!(sections[2].heading.as_deref(), Some("Two"));
        assert_eq!(sections[2].body, "beta\ngamma\n");
    }

    #[test]
    fn test_hash_without_space_is_not_heading() {
        let sections = split_sections("#hashtag\ntext\n");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, None);
    }

    #[tokio::test]
    async fn test_extract_sections_in_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("guide.md");
        std::fs::write(&path, "# Setup\nInstall <b>it</b>.\n\n# Usage\nRun it.\n").unwrap();

        let docs = MarkdownExtractor::default().extract(&path).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "Setup\nInstall it.");
        assert_eq!(docs[1].content, "Usage\nRun it.");
        assert!(docs.iter().all(|d| d.meta(META_SOURCE).is_some()));
    }

    #[tokio::test]
    async fn test_empty_markdown_yields_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.md");
        std::fs::write(&path, "\n\n").unwrap();

        let docs = MarkdownExtractor::default().extract(&path).await.unwrap();
        assert!(docs.is_empty());
    }
}
