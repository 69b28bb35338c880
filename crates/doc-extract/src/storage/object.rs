//! S3-compatible object storage backend.
//!
//! Uses the `object_store` crate, which works against AWS S3, MinIO and other
//! S3-compatible services. The client is internally synchronized, so one
//! instance serves every concurrent request.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use super::stream::ChunkStream;
use super::StorageBackend;
use crate::error::{Error, Result};

const DEFAULT_REGION: &str = "us-east-1";

/// Object storage backend bound to one bucket.
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStorage {
    /// Build an S3 client for `bucket`.
    ///
    /// Fails with `UnsupportedBackendConfig` if the bucket is empty, only one
    /// half of the credential pair is set, or the endpoint is not a URL.
    pub fn new(
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        endpoint: &str,
        region: &str,
    ) -> Result<Self> {
        if bucket.trim().is_empty() {
            return Err(Error::UnsupportedBackendConfig(
                "object store bucket name is required".to_string(),
            ));
        }

        let region = if region.is_empty() { DEFAULT_REGION } else { region };
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region(region);

        match (access_key.is_empty(), secret_key.is_empty()) {
            (false, false) => {
                builder = builder
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key);
            }
            (true, true) => {}
            _ => {
                return Err(Error::UnsupportedBackendConfig(
                    "access key and secret key must be set together".to_string(),
                ))
            }
        }

        if !endpoint.is_empty() {
            let url = reqwest::Url::parse(endpoint).map_err(|e| {
                Error::UnsupportedBackendConfig(format!("invalid endpoint '{}': {}", endpoint, e))
            })?;
            // Custom endpoints (MinIO and friends) need path-style requests
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(url.scheme() == "http")
                .with_virtual_hosted_style_request(false);
        }

        let store = builder
            .build()
            .map_err(|e| Error::UnsupportedBackendConfig(e.to_string()))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: bucket.to_string(),
        })
    }

    /// Create from an existing ObjectStore instance.
    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_path(key: &str) -> ObjectPath {
        ObjectPath::from(key)
    }
}

/// Translate a missing key into `FileNotFound`; everything else passes through.
fn translate(key: &str, err: object_store::Error) -> Error {
    match err {
        object_store::Error::NotFound { .. } => Error::FileNotFound(key.to_string()),
        other => Error::ObjectStore(other),
    }
}

impl std::fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorage")
            .field("bucket", &self.bucket)
            .field("store", &self.store.to_string())
            .finish()
    }
}

#[async_trait]
impl StorageBackend for ObjectStorage {
    #[instrument(skip(self, data), fields(bucket = %self.bucket, key = %key, size = data.len()))]
    async fn save(&self, key: &str, data: Bytes) -> Result<()> {
        let path = Self::object_path(key);
        debug!("Writing {} bytes to s3://{}/{}", data.len(), self.bucket, path);

        self.store.put(&path, data.into()).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, key = %key))]
    async fn load_once(&self, key: &str) -> Result<Bytes> {
        let path = Self::object_path(key);
        debug!("Reading s3://{}/{}", self.bucket, path);

        let result = self.store.get(&path).await.map_err(|e| translate(key, e))?;
        result.bytes().await.map_err(|e| translate(key, e))
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, key = %key))]
    async fn load_stream(&self, key: &str) -> Result<ChunkStream> {
        let path = Self::object_path(key);
        let result = self.store.get(&path).await.map_err(|e| translate(key, e))?;

        let owned_key = key.to_string();
        let chunks = result
            .into_stream()
            .map_err(move |e| translate(&owned_key, e))
            .boxed();

        Ok(ChunkStream::new(key, chunks))
    }

    #[instrument(skip(self, target), fields(bucket = %self.bucket, key = %key))]
    async fn download(&self, key: &str, target: &Path) -> Result<()> {
        let mut chunks = self.load_stream(key).await?;
        let mut file = fs::File::create(target).await?;
        debug!("Downloading s3://{}/{} to {:?}", self.bucket, key, target);

        let copied: Result<u64> = async {
            let mut written = 0u64;
            while let Some(chunk) = chunks.next_chunk().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok(written)
        }
        .await;

        match copied {
            Ok(written) => {
                debug!("Downloaded {} bytes", written);
                Ok(())
            }
            Err(e) => {
                drop(file);
                if let Err(cleanup) = fs::remove_file(target).await {
                    warn!("Failed to remove partial download {:?}: {}", target, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn exists(&self, key: &str) -> bool {
        let path = Self::object_path(key);
        match self.store.head(&path).await {
            Ok(_) => true,
            Err(object_store::Error::NotFound { .. }) => false,
            Err(e) => {
                debug!("Existence probe for s3://{}/{} failed, reporting absent: {}", self.bucket, key, e);
                false
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "object_store"
    }
}
