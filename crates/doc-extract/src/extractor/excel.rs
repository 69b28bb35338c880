//! Spreadsheet extractor

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::{Path, PathBuf};

use super::{display_name, run_blocking, source_of, Extractor};
use crate::error::{Error, Result};
use crate::types::document::{Document, META_ROW, META_SHEET, META_SOURCE};

/// One document per non-empty data row of every sheet.
///
/// The first row of each sheet is the header. Cells render as
/// `header:value;`, skipping empty cells.
#[derive(Debug, Clone, Default)]
pub struct ExcelExtractor;

impl ExcelExtractor {
    pub fn new() -> Self {
        Self
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => {
            tracing::debug!("Skipping error cell: {:?}", e);
            String::new()
        }
    }
}

/// Render one sheet's rows after the header.
pub fn sheet_documents(sheet: &str, rows: &[Vec<String>], source: &str) -> Vec<Document> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    data.iter()
        .enumerate()
        .filter_map(|(row, cells)| {
            let content: String = cells
                .iter()
                .enumerate()
                .filter(|(_, value)| !value.is_empty())
                .map(|(i, value)| {
                    let column = header
                        .get(i)
                        .filter(|h| !h.is_empty())
                        .cloned()
                        .unwrap_or_else(|| format!("column{}", i + 1));
                    format!("{}:{};", column, value)
                })
                .collect();

            if content.is_empty() {
                return None;
            }
            Some(
                Document::new(content)
                    .with_meta(META_SOURCE, source)
                    .with_meta(META_SHEET, sheet)
                    .with_meta(META_ROW, row),
            )
        })
        .collect()
}

fn parse_workbook(path: PathBuf) -> Result<Vec<Document>> {
    let filename = display_name(&path);
    let source = source_of(&path);
    let mut workbook =
        open_workbook_auto(&path).map_err(|e| Error::file_parse(&filename, e.to_string()))?;

    let mut documents = Vec::new();
    for sheet in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| Error::file_parse(&filename, format!("sheet '{}': {}", sheet, e)))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        documents.extend(sheet_documents(&sheet, &rows, &source));
    }

    Ok(documents)
}

#[async_trait]
impl Extractor for ExcelExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<Document>> {
        if !tokio::fs::try_exists(path).await? {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let path = path.to_path_buf();
        run_blocking(move || parse_workbook(path)).await
    }

    fn name(&self) -> &'static str {
        "excel"
    }
}
