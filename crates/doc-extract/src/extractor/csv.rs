//! CSV extractor, one document per data row

use async_trait::async_trait;
use std::path::Path;

use super::{display_name, encoding, read_input, run_blocking, source_of, Extractor};
use crate::error::{Error, Result};
use crate::types::document::{Document, META_ROW, META_SOURCE};

/// Rows rendered as `column: value` lines.
#[derive(Debug, Clone)]
pub struct CsvExtractor {
    autodetect_encoding: bool,
}

impl CsvExtractor {
    pub fn new(autodetect_encoding: bool) -> Self {
        Self { autodetect_encoding }
    }
}

impl Default for CsvExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Parse CSV text with a header row into per-row documents.
pub fn parse_rows(text: &str, source: &str, filename: &str) -> Result<Vec<Document>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::file_parse(filename, e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut documents = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::file_parse(filename, e.to_string()))?;

        // Short rows are padded; fields past the header get positional names.
        let content = (0..headers.len().max(record.len()))
            .map(|i| {
                let column = headers
                    .get(i)
                    .filter(|h| !h.is_empty())
                    .cloned()
                    .unwrap_or_else(|| format!("column{}", i + 1));
                format!("{}: {}", column, record.get(i).unwrap_or("").trim())
            })
            .collect::<Vec<_>>()
            .join("\n");

        documents.push(
            Document::new(content)
                .with_meta(META_SOURCE, source)
                .with_meta(META_ROW, row),
        );
    }

    Ok(documents)
}

#[async_trait]
impl Extractor for CsvExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<Document>> {
        let bytes = read_input(path).await?;
        let filename = display_name(path);
        let text = encoding::decode(&bytes, self.autodetect_encoding, &filename)?;
        let source = source_of(path);

        run_blocking(move || parse_rows(&text, &source, &filename)).await
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
