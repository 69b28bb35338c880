//! doc-extract: document text extraction service
//!
//! Turns stored files and fetched URLs into lists of [`Document`]s. Input
//! bytes come from a pluggable storage backend (local directory or an
//! S3-compatible object store), the file extension picks an extractor, and
//! formats without a native parser go to an Unstructured partition API.

pub mod config;
pub mod error;
pub mod extractor;
pub mod processor;
pub mod server;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use processor::{Extracted, ExtractProcessor};
pub use storage::{StorageBackend, StorageConfig};
pub use types::{Document, EtlType, ExtractSetting};
