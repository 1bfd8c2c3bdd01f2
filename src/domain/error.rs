//! Domain-level error types for chat-archive.
//!
//! All errors are typed with `thiserror` and carry enough context for an
//! operator to act on them without a backtrace.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing credential, connection string, or unreadable config file.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The document store could not be reached or queried.
    #[error("Connectivity error: {message}")]
    Connectivity {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Input data is not in the expected shape.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// A single session document could not be normalized.
    #[error("Invalid session {session_id}: {message}")]
    InvalidRecord { session_id: String, message: String },

    /// A local file given for upload does not exist.
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The vector store API rejected a request or was unreachable.
    #[error("Vector store API error: {message}")]
    Api {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// JSON parsing or serialization failed.
    #[error("JSON parse error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a connectivity error from a driver error.
    pub fn connectivity(err: mongodb::error::Error) -> Self {
        Self::Connectivity {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create an API error from an HTTP client error.
    pub fn api(err: reqwest::Error) -> Self {
        Self::Api {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a JSON parse error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Create a per-record normalization error.
    pub fn invalid_record(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            session_id: session_id.into(),
            message: message.into(),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
