//! Error types for document extraction

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Extraction and storage errors
#[derive(Debug, Error)]
pub enum Error {
    /// Storage key or local path is absent (uniform across backends)
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Storage backend could not be constructed from its configuration
    #[error("Unsupported storage backend configuration: {0}")]
    UnsupportedBackendConfig(String),

    /// A remote conversion service call failed
    #[error("Remote service error: {0}")]
    RemoteService(String),

    /// Fetching a URL for extraction failed
    #[error("Failed to fetch '{url}': {message}")]
    NetworkFetch { url: String, message: String },

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Malformed client request; the message is shown to the client as is
    #[error("{0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Object store error other than a missing key
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a remote service error
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteService(message.into())
    }

    /// Create a network fetch error
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NetworkFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::FileNotFound(_))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::FileNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidRequest(_) | Error::FileParse { .. } | Error::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::RemoteService(_) | Error::NetworkFetch { .. } => StatusCode::BAD_GATEWAY,
            Error::UnsupportedBackendConfig(_)
            | Error::Config(_)
            | Error::ObjectStore(_)
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));

        (status, body).into_response()
    }
}
