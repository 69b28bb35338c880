//! Local filesystem storage backend.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

use super::stream::{ChunkStream, LOCAL_CHUNK_SIZE};
use super::StorageBackend;
use crate::error::{Error, Result};

/// Join a storage key onto a root folder.
///
/// An empty root or one ending in `/` is concatenated directly; otherwise a
/// single `/` is inserted.
pub fn join_key(root: &str, key: &str) -> String {
    if root.is_empty() || root.ends_with('/') {
        format!("{}{}", root, key)
    } else {
        format!("{}/{}", root, key)
    }
}

/// Local filesystem storage rooted at a folder.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    folder: String,
}

impl LocalStorage {
    /// Create a backend rooted at `folder`. The folder is created lazily on first save.
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// Root folder
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Filesystem path for a key
    pub fn resolve(&self, key: &str) -> PathBuf {
        PathBuf::from(join_key(&self.folder, key))
    }
}

/// Map an io error on `key` to `FileNotFound` when the file is missing.
fn map_missing(key: &str, e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::NotFound {
        Error::FileNotFound(key.to_string())
    } else {
        Error::Io(e)
    }
}

/// Read the next chunk of an open file; `None` at end of file.
async fn read_chunk(mut file: fs::File) -> Result<Option<(Bytes, fs::File)>> {
    let mut buf = vec![0u8; LOCAL_CHUNK_SIZE];
    let n = file.read(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    buf.truncate(n);
    Ok(Some((Bytes::from(buf), file)))
}

#[async_trait]
impl StorageBackend for LocalStorage {
    #[instrument(skip(self, data), fields(key = %key, size = data.len()))]
    async fn save(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.resolve(key);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        debug!("Writing {} bytes to {:?}", data.len(), path);
        fs::write(&path, &data).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn load_once(&self, key: &str) -> Result<Bytes> {
        let path = self.resolve(key);
        debug!("Reading from {:?}", path);

        fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| map_missing(key, e))
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn load_stream(&self, key: &str) -> Result<ChunkStream> {
        let path = self.resolve(key);
        let file = fs::File::open(&path)
            .await
            .map_err(|e| map_missing(key, e))?;
        debug!("Streaming {:?} in {} byte chunks", path, LOCAL_CHUNK_SIZE);

        let chunks = futures::stream::try_unfold(file, read_chunk);
        Ok(ChunkStream::new(key, chunks.boxed()))
    }

    #[instrument(skip(self, target), fields(key = %key))]
    async fn download(&self, key: &str, target: &Path) -> Result<()> {
        let source = self.resolve(key);
        fs::metadata(&source)
            .await
            .map_err(|e| map_missing(key, e))?;

        debug!("Copying {:?} to {:?}", source, target);
        fs::copy(&source, target).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        let path = self.resolve(key);
        match fs::try_exists(&path).await {
            Ok(found) => found,
            Err(e) => {
                debug!("Existence probe for {:?} failed, reporting absent: {}", path, e);
                false
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
