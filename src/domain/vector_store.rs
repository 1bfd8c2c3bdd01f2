//! Vector store models.
//!
//! These mirror the subset of the vector store API objects the tool reads.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Processing status of a vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VectorStoreStatus {
    InProgress,
    Completed,
    Failed,
    Expired,
    /// Any status this tool does not know about.
    Other(String),
}

impl From<String> for VectorStoreStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "expired" => Self::Expired,
            _ => Self::Other(value),
        }
    }
}

impl From<VectorStoreStatus> for String {
    fn from(status: VectorStoreStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for VectorStoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Expired => write!(f, "expired"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Per-state file counts of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    #[serde(default)]
    pub in_progress: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub cancelled: u64,
    #[serde(default)]
    pub total: u64,
}

impl fmt::Display for FileCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} completed, {} in progress, {} failed",
            self.completed, self.total, self.in_progress, self.failed
        )
    }
}

/// Expiration policy of a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationPolicy {
    pub anchor: String,
    pub days: u32,
}

/// A vector store as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorStore {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: VectorStoreStatus,
    #[serde(default)]
    pub file_counts: FileCounts,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub expires_after: Option<ExpirationPolicy>,
}

/// A file accepted by the files endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub bytes: u64,
}

/// Result of a sequential batch upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub file_ids: Vec<String>,
    pub failures: Vec<UploadFailure>,
}

impl UploadReport {
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.file_ids.len() + self.failures.len()
    }
}

/// A file the batch upload skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// How a status poll ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed,
    TimedOut,
    /// Retrieving the status failed; polling stopped.
    Error(String),
}

impl PollOutcome {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}
