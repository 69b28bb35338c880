//! PDF extractor, one document per page

use async_trait::async_trait;
use std::path::Path;

use super::{display_name, read_input, run_blocking, source_of, Extractor};
use crate::error::{Error, Result};
use crate::types::document::{Document, META_PAGE, META_SOURCE};

/// Characters that font encodings commonly leave behind in extracted text
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{0}', ""),
    ('\u{00A0}', " "),
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Normalize ligatures and control characters, trim lines and drop blank ones.
pub fn cleanup_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => cleaned.push_str(to),
            None => cleaned.push(c),
        }
    }

    cleaned
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Page texts decoded by lopdf.
struct PageTexts {
    /// Pages in the document, decodable or not
    total: usize,
    /// Decoded pages as (1-indexed page number, cleaned text)
    decoded: Vec<(u32, String)>,
}

fn extract_pages(data: &[u8], filename: &str) -> Result<PageTexts> {
    let doc = lopdf::Document::load_mem(data)
        .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

    let pages = doc.get_pages();
    let mut decoded = Vec::with_capacity(pages.len());
    for page_number in pages.keys().copied() {
        match doc.extract_text(&[page_number]) {
            Ok(text) => decoded.push((page_number, cleanup_text(&text))),
            Err(e) => tracing::debug!("Could not extract text from page {}: {}", page_number, e),
        }
    }

    Ok(PageTexts {
        total: pages.len(),
        decoded,
    })
}

/// Whole-document text via pdf-extract, which panics on some fonts lopdf
/// tolerates. A panic is reported as a parse error.
fn fallback_text(data: &[u8], filename: &str) -> Result<String> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data)) {
        Ok(Ok(text)) => Ok(cleanup_text(&text)),
        Ok(Err(e)) => Err(Error::file_parse(filename, format!("pdf-extract failed: {}", e))),
        Err(_) => Err(Error::file_parse(filename, "pdf-extract panicked while decoding")),
    }
}

fn parse_pdf(data: Vec<u8>, filename: String, source: String) -> Result<Vec<Document>> {
    let PageTexts { total, decoded } = extract_pages(&data, &filename)?;
    let undecodable = decoded.is_empty();

    let documents: Vec<Document> = decoded
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(page, text)| {
            Document::new(text)
                .with_meta(META_SOURCE, &source)
                .with_meta(META_PAGE, page)
        })
        .collect();

    if !documents.is_empty() || total == 0 {
        return Ok(documents);
    }

    // No page text from lopdf; pdf-extract decodes more font types.
    tracing::debug!("No page text from lopdf for {}, trying pdf-extract", filename);
    match fallback_text(&data, &filename) {
        Ok(text) if text.is_empty() => Ok(Vec::new()),
        Ok(text) => Ok(vec![Document::new(text)
            .with_meta(META_SOURCE, &source)
            .with_meta(META_PAGE, 1)]),
        // Every page failed to decode, so this is not just a scanned document.
        Err(e) if undecodable => Err(e),
        Err(e) => {
            tracing::warn!("{}", e);
            Ok(Vec::new())
        }
    }
}

/// Page-by-page PDF text.
///
/// Blank pages (scanned images, empty pages) are skipped.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<Document>> {
        let data = read_input(path).await?;
        let filename = display_name(path);
        let source = source_of(path);

        run_blocking(move || parse_pdf(data, filename, source)).await
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}
