//! Application configuration.
//!
//! Built once at process start (file, `.env`, environment) and passed by
//! reference into every component. Nothing below `main` reads the
//! environment directly.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{AppError, Result};

/// Document store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// MongoDB connection string. Required for any export.
    #[serde(default)]
    pub uri: Option<String>,

    /// Database holding the session collection.
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection holding one document per chat session.
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: None,
            database: default_database(),
            collection: default_collection(),
        }
    }
}

fn default_database() -> String {
    "ailisaprobability".to_string()
}

fn default_collection() -> String {
    "chats".to_string()
}

impl DatabaseConfig {
    /// Get the connection string or fail before any I/O happens.
    ///
    /// # Errors
    /// Returns `Config` if no URI was configured.
    pub fn require_uri(&self) -> Result<&str> {
        self.uri
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AppError::Config {
                message: "MONGODB_URI not found in environment or config file".into(),
            })
    }
}

/// Export output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for generated export file names (defaults to the current directory).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Vector store API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Bearer credential for the API.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API root, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Seconds between status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Default deadline for `wait` in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Courtesy delay after each upload in a batch, in milliseconds.
    #[serde(default = "default_upload_delay")]
    pub upload_delay_ms: u64,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_timeout(),
            upload_delay_ms: default_upload_delay(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

const fn default_poll_interval() -> u64 {
    10
}

const fn default_timeout() -> u64 {
    300
}

const fn default_upload_delay() -> u64 {
    1000
}

impl VectorStoreConfig {
    /// Get the API key or fail before any request is made.
    ///
    /// # Errors
    /// Returns `Config` if no key was configured.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::Config {
                message: "OPENAI_API_KEY not found in environment or config file".into(),
            })
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn upload_delay(&self) -> Duration {
        Duration::from_millis(self.upload_delay_ms)
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,
}

impl AppConfig {
    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chat-archive")
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Directory generated export names are placed in.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Copy with secrets masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.database.uri = copy.database.uri.as_deref().map(redact_uri);
        copy.vector_store.api_key = copy.vector_store.api_key.map(|_| "********".to_string());
        copy
    }
}

/// Mask the credentials part of a connection string.
fn redact_uri(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://********{}", &uri[..scheme_end], &uri[at..])
        }
        _ => uri.to_string(),
    }
}
