//! Application state for the extraction server

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::processor::ExtractProcessor;
use crate::storage::StorageBackend;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    processor: ExtractProcessor,
}

impl AppState {
    /// Create state around an initialized storage backend.
    pub fn new(config: AppConfig, storage: Arc<dyn StorageBackend>) -> Result<Self> {
        tracing::info!(
            "Initializing extraction state (storage: {}, unstructured: {})",
            storage.backend_name(),
            config.unstructured.api_url.as_deref().unwrap_or("not configured")
        );

        let processor = ExtractProcessor::new(storage, config.unstructured.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, processor }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the extraction processor
    pub fn processor(&self) -> &ExtractProcessor {
        &self.inner.processor
    }
}
