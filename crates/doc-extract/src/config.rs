//! Configuration for the extraction service
//!
//! Values come from defaults, then an optional TOML file, then environment
//! variables (highest precedence).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::storage::StorageConfig;

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "DOC_EXTRACT_CONFIG";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend
    #[serde(default)]
    pub storage: StorageConfig,
    /// Partition service used by the remote variants
    #[serde(default)]
    pub unstructured: UnstructuredConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Unstructured partition API configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnstructuredConfig {
    /// Partition endpoint, e.g. `http://localhost:8000/general/v0/general`.
    /// Remote variants fail when this is unset.
    pub api_url: Option<String>,
    /// Sent as the `unstructured-api-key` header when set
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Read a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Defaults, then the file named by `DOC_EXTRACT_CONFIG` if set, then
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => {
                tracing::info!("Loading configuration from {}", path);
                Self::from_file(path)?
            }
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(host) = var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid SERVER_PORT '{}': {}", port, e)))?;
        }

        if let Some(url) = var("UNSTRUCTURED_API_URL") {
            self.unstructured.api_url = Some(url);
        }
        if let Some(key) = var("UNSTRUCTURED_API_KEY") {
            self.unstructured.api_key = Some(key);
        }

        match var("STORAGE_TYPE").map(|t| t.to_lowercase()).as_deref() {
            Some("local") => {
                let path = var("STORAGE_LOCAL_PATH").unwrap_or_else(|| match &self.storage {
                    StorageConfig::Local { path } => path.clone(),
                    _ => "/tmp".to_string(),
                });
                self.storage = StorageConfig::local(path);
            }
            Some("s3") | Some("object_store") => {
                self.storage = StorageConfig::object_store(
                    var("S3_BUCKET_NAME").unwrap_or_default(),
                    var("S3_ACCESS_KEY").unwrap_or_default(),
                    var("S3_SECRET_KEY").unwrap_or_default(),
                    var("S3_ENDPOINT").unwrap_or_default(),
                    var("S3_REGION").unwrap_or_default(),
                );
            }
            Some(other) => {
                return Err(Error::Config(format!("Unknown STORAGE_TYPE '{}'", other)));
            }
            None => {
                if let Some(path) = var("STORAGE_LOCAL_PATH") {
                    if matches!(self.storage, StorageConfig::Local { .. }) {
                        self.storage = StorageConfig::local(path);
                    }
                }
            }
        }

        Ok(())
    }

    /// Socket address string for the server
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
