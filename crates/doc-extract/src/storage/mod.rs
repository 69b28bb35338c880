//! Uniform byte storage over the local filesystem or an S3-compatible object store.
//!
//! Callers address objects by a bare string key. Both backends give the same
//! semantics: `save` overwrites, `load`/`download` fail with
//! [`Error::FileNotFound`] when the key is absent, and `exists` never fails.
//!
//! # Lifecycle
//!
//! A backend is built once from a [`StorageConfig`] at startup and shared as
//! `Arc<dyn StorageBackend>`. [`init`] additionally records it as the process
//! instance (retrievable with [`global`]); calling it a second time is an
//! error. Components such as the extract processor take the backend as a
//! constructor argument instead of reaching for the global.
//!
//! ```no_run
//! use doc_extract::storage::{self, StorageConfig};
//! use bytes::Bytes;
//!
//! # async fn example() -> doc_extract::Result<()> {
//! let backend = storage::init(&StorageConfig::local("/tmp/store"))?;
//! backend.save("docs/x.txt", Bytes::from("hello")).await?;
//! assert!(backend.exists("docs/x.txt").await);
//! # Ok(())
//! # }
//! ```

mod local;
mod object;
mod stream;

pub use local::{join_key, LocalStorage};
pub use object::ObjectStorage;
pub use stream::{ChunkStream, LOCAL_CHUNK_SIZE};

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Storage backend selection. Exactly one is active per process.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Local filesystem rooted at `path`
    Local {
        /// Root folder
        path: String,
    },
    /// S3-compatible object store
    ObjectStore {
        bucket: String,
        #[serde(default)]
        access_key: String,
        #[serde(default)]
        secret_key: String,
        #[serde(default)]
        endpoint: String,
        #[serde(default)]
        region: String,
    },
}

impl StorageConfig {
    /// Local filesystem storage
    pub fn local(path: impl Into<String>) -> Self {
        Self::Local { path: path.into() }
    }

    /// Object store storage
    pub fn object_store(
        bucket: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        endpoint: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::ObjectStore {
            bucket: bucket.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            endpoint: endpoint.into(),
            region: region.into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::local("/tmp")
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { path } => f.debug_struct("Local").field("path", path).finish(),
            Self::ObjectStore {
                bucket,
                access_key,
                endpoint,
                region,
                ..
            } => f
                .debug_struct("ObjectStore")
                .field("bucket", bucket)
                .field("access_key", access_key)
                .field("secret_key", &"<redacted>")
                .field("endpoint", endpoint)
                .field("region", region)
                .finish(),
        }
    }
}

/// Result of [`StorageBackend::load`]
#[derive(Debug)]
pub enum Loaded {
    /// Whole object read at once
    Buffered(Bytes),
    /// Lazy single-pass chunk sequence
    Streaming(ChunkStream),
}

impl Loaded {
    /// Collapse either form into one buffer, draining a stream if needed.
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self {
            Loaded::Buffered(bytes) => Ok(bytes),
            Loaded::Streaming(stream) => stream.collect_bytes().await,
        }
    }
}

/// Key/value byte storage shared by all extraction requests.
///
/// Implementations must be safe for concurrent read-only use.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write `data` under `key`, replacing any previous object.
    async fn save(&self, key: &str, data: Bytes) -> Result<()>;

    /// Read the whole object.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if the key does not exist.
    async fn load_once(&self, key: &str) -> Result<Bytes>;

    /// Open a single-pass chunk stream over the object.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if the key does not exist.
    async fn load_stream(&self, key: &str) -> Result<ChunkStream>;

    /// Buffered or streaming read depending on `streaming`.
    async fn load(&self, key: &str, streaming: bool) -> Result<Loaded> {
        if streaming {
            Ok(Loaded::Streaming(self.load_stream(key).await?))
        } else {
            Ok(Loaded::Buffered(self.load_once(key).await?))
        }
    }

    /// Materialize the object at a local file path.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if the key does not exist.
    async fn download(&self, key: &str, target: &Path) -> Result<()>;

    /// Whether the key exists.
    ///
    /// Lossy by contract: any error while probing is reported as `false`.
    async fn exists(&self, key: &str) -> bool;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Build a backend from configuration.
pub fn create_storage(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
    match config {
        StorageConfig::Local { path } => Ok(Arc::new(LocalStorage::new(path.clone()))),
        StorageConfig::ObjectStore {
            bucket,
            access_key,
            secret_key,
            endpoint,
            region,
        } => Ok(Arc::new(ObjectStorage::new(
            bucket, access_key, secret_key, endpoint, region,
        )?)),
    }
}

static STORAGE: OnceCell<Arc<dyn StorageBackend>> = OnceCell::new();

/// Build the process-wide backend. Fails if one was already installed.
pub fn init(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
    let backend = create_storage(config)?;
    STORAGE
        .set(backend.clone())
        .map_err(|_| Error::Config("storage backend already initialized".to_string()))?;

    tracing::info!(backend = backend.backend_name(), "Storage backend initialized");
    Ok(backend)
}

/// The process-wide backend, if [`init`] has run.
pub fn global() -> Option<Arc<dyn StorageBackend>> {
    STORAGE.get().cloned()
}
