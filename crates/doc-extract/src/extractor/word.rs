//! Word (.docx) extractor

use async_trait::async_trait;
use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, TableCellContent, TableChild,
    TableRowChild,
};
use std::path::Path;

use super::{display_name, read_input, run_blocking, source_of, Extractor};
use crate::error::{Error, Result};
use crate::types::document::{Document, META_SOURCE};

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}

/// Body text in document order. Table rows render as ` | `-separated cells.
#[allow(irrefutable_let_patterns)]
pub fn docx_text(data: &[u8], filename: &str) -> Result<String> {
    let docx = docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

    let mut lines: Vec<String> = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => lines.push(paragraph_text(p)),
            DocumentChild::Table(table) => {
                for row in &table.rows {
                    let TableChild::TableRow(row) = row else {
                        continue;
                    };
                    let cells: Vec<String> = row
                        .cells
                        .iter()
                        .filter_map(|cell| match cell {
                            TableRowChild::TableCell(cell) => Some(cell),
                            #[allow(unreachable_patterns)]
                            _ => None,
                        })
                        .map(|cell| {
                            cell.children
                                .iter()
                                .filter_map(|content| match content {
                                    TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                                    _ => None,
                                })
                                .collect::<Vec<_>>()
                                .join(" ")
                        })
                        .collect();
                    lines.push(cells.join(" | "));
                }
            }
            _ => {}
        }
    }

    Ok(lines.join("\n").trim().to_string())
}

/// Whole document as one text document.
#[derive(Debug, Clone, Default)]
pub struct WordExtractor;

impl WordExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for WordExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<Document>> {
        let data = read_input(path).await?;
        let filename = display_name(path);
        let text = run_blocking(move || docx_text(&data, &filename)).await?;

        Ok(vec![Document::new(text).with_meta(META_SOURCE, source_of(path))])
    }

    fn name(&self) -> &'static str {
        "word"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Run, Table, TableCell, TableRow};
    use tempfile::TempDir;

    fn pack(docx: Docx) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut cursor).unwrap();
        cursor.into_inner()
    }

    fn para(text: &str) -> docx_rs::Paragraph {
        docx_rs::Paragraph::new().add_run(Run::new().add_text(text))
    }

    #[test]
    fn test_paragraphs_and_tables() {
        let table = Table::new(vec![
            TableRow::new(vec![
                TableCell::new().add_paragraph(para("Name")),
                TableCell::new().add_paragraph(para("Qty")),
            ]),
            TableRow::new(vec![
                TableCell::new().add_paragraph(para("Bolt")),
                TableCell::new().add_paragraph(para("12")),
            ]),
        ]);
        let data = pack(
            Docx::new()
                .add_paragraph(para("Inventory"))
                .add_table(table)
                .add_paragraph(para("End")),
        );

        let text = docx_text(&data, "inv.docx").unwrap();
        assert_eq!(text, "Inventory\nName | Qty\nBolt | 12\nEnd");
    }

    #[tokio::test]
    async fn test_empty_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.docx");
        std::fs::write(&path, pack(Docx::new())).unwrap();

        let docs = WordExtractor::new().extract(&path).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "");
    }

    #[tokio::test]
    async fn test_invalid_docx() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.docx");
        std::fs::write(&path, b"plain text").unwrap();

        let err = WordExtractor::new().extract(&path).await.unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }
}
