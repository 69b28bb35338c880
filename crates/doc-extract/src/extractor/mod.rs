//! Format-specific converters from a local file to documents
//!
//! Every variant implements [`Extractor`]. Local variants parse on the
//! blocking pool; remote variants call an Unstructured-compatible partition
//! service.

pub mod csv;
pub mod encoding;
pub mod excel;
pub mod html;
pub mod markdown;
pub mod pdf;
pub mod text;
pub mod unstructured;
pub mod word;

pub use self::csv::CsvExtractor;
pub use self::excel::ExcelExtractor;
pub use self::html::HtmlExtractor;
pub use self::markdown::MarkdownExtractor;
pub use self::pdf::PdfExtractor;
pub use self::text::TextExtractor;
pub use self::unstructured::{RemoteExtractor, RemoteFormat, UnstructuredClient};
pub use self::word::WordExtractor;

use async_trait::async_trait;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Document;

/// Converts one local file into an ordered list of documents.
///
/// Implementations never modify the input file.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract documents in reading order.
    async fn extract(&self, path: &Path) -> Result<Vec<Document>>;

    /// Variant name for logging
    fn name(&self) -> &'static str;
}

/// Run a CPU-bound parse on the blocking pool.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
}

/// Read a whole input file, reporting a missing path as `FileNotFound`.
pub(crate) async fn read_input(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.display().to_string())
        } else {
            Error::Io(e)
        }
    })
}

/// Value recorded under the `source` metadata key
pub(crate) fn source_of(path: &Path) -> String {
    path.display().to_string()
}

/// File name used in parse error messages
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
