//! Vector store lifecycle operations.
//!
//! Wraps a `VectorStoreApi` with the sequencing the CLI needs: existence
//! checks before uploads, a courtesy delay between batch uploads, and a
//! deadline-bounded status poll.

use std::path::{Path, PathBuf};
use std::time::Duration;

use walkdir::WalkDir;

use crate::domain::{
    AppError, Clock, PollOutcome, Result, UploadFailure, UploadReport, VectorStore,
    VectorStoreApi, VectorStoreConfig, VectorStoreStatus,
};

/// Timing knobs for uploads and polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerTiming {
    pub poll_interval: Duration,
    pub upload_delay: Duration,
}

impl From<&VectorStoreConfig> for ManagerTiming {
    fn from(config: &VectorStoreConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            upload_delay: config.upload_delay(),
        }
    }
}

/// Replace every directory argument with the files beneath it.
///
/// Directories are walked recursively in file-name order. Other paths are
/// kept as given, so missing files still surface as upload failures.
#[must_use]
pub fn expand_upload_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded = Vec::with_capacity(paths.len());

    for path in paths {
        if !path.is_dir() {
            expanded.push(path.clone());
            continue;
        }

        let before = expanded.len();
        for entry in WalkDir::new(path).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.path().is_file() => expanded.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(dir = %path.display(), "Skipping unreadable entry: {}", e);
                }
            }
        }

        let found = expanded.len() - before;
        if found == 0 {
            tracing::warn!(dir = %path.display(), "No files found in folder");
        } else {
            tracing::info!(dir = %path.display(), "Found {} files", found);
        }
    }

    expanded
}

/// Lifecycle manager over a vector store API and a clock.
pub struct VectorStoreManager<A, C> {
    api: A,
    clock: C,
    timing: ManagerTiming,
}

impl<A: VectorStoreApi, C: Clock> VectorStoreManager<A, C> {
    #[must_use]
    pub const fn new(api: A, clock: C, timing: ManagerTiming) -> Self {
        Self { api, clock, timing }
    }

    /// Create a store and return it.
    ///
    /// # Errors
    /// Returns `Api` if the service rejects the request.
    pub fn create_store(&self, name: &str, description: Option<&str>) -> Result<VectorStore> {
        let store = self.api.create_store(name, description)?;
        tracing::info!(id = %store.id, status = %store.status, "Vector store created");
        Ok(store)
    }

    /// Upload one local file and attach it to `store_id`.
    ///
    /// # Errors
    /// Returns `FileNotFound` if `path` does not exist, `InvalidData` if it
    /// is not a regular file, `Io` or `Api` if the upload or attach fails.
    pub fn upload_file(&self, path: &Path, store_id: &str) -> Result<String> {
        if !path.exists() {
            return Err(AppError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(AppError::InvalidData {
                message: format!("{} is not a regular file", path.display()),
            });
        }

        let uploaded = self.api.upload_file(path)?;
        tracing::info!(path = %path.display(), file_id = %uploaded.id, "File uploaded");

        self.api.attach_file(store_id, &uploaded.id)?;
        tracing::info!(store_id, file_id = %uploaded.id, "File added to vector store");

        Ok(uploaded.id)
    }

    /// Upload files one after another, skipping the ones that fail.
    #[must_use]
    pub fn upload_files(&self, paths: &[PathBuf], store_id: &str) -> UploadReport {
        let mut report = UploadReport::default();

        for path in paths {
            match self.upload_file(path, store_id) {
                Ok(file_id) => {
                    report.file_ids.push(file_id);
                    self.clock.sleep(self.timing.upload_delay);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to upload: {}", e);
                    report.failures.push(UploadFailure {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Uploaded {} out of {} files",
            report.file_ids.len(),
            report.attempted()
        );

        report
    }

    /// Current state of a store.
    ///
    /// # Errors
    /// Returns `Api` if the service rejects the request.
    pub fn store_info(&self, store_id: &str) -> Result<VectorStore> {
        self.api.retrieve_store(store_id)
    }

    /// All stores visible to the credential.
    ///
    /// # Errors
    /// Returns `Api` if the service rejects the request.
    pub fn list_stores(&self) -> Result<Vec<VectorStore>> {
        self.api.list_stores()
    }

    /// Poll until the store reaches a terminal status or `timeout` elapses.
    pub fn poll_until_terminal(&self, store_id: &str, timeout: Duration) -> PollOutcome {
        let deadline = chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX);
        let start = self.clock.now();

        while self.clock.now() - start < deadline {
            let store = match self.api.retrieve_store(store_id) {
                Ok(store) => store,
                Err(e) => {
                    tracing::warn!(store_id, "Error checking vector store status: {}", e);
                    return PollOutcome::Error(e.to_string());
                }
            };

            match store.status {
                VectorStoreStatus::Completed => return PollOutcome::Completed,
                VectorStoreStatus::Failed => return PollOutcome::Failed,
                status => {
                    tracing::info!(store_id, %status, "Waiting for processing");
                    self.clock.sleep(self.timing.poll_interval);
                }
            }
        }

        tracing::warn!(store_id, ?timeout, "Timed out waiting for vector store processing");
        PollOutcome::TimedOut
    }

    /// `true` only if processing completed within `timeout`.
    pub fn wait_for_processing(&self, store_id: &str, timeout: Duration) -> bool {
        self.poll_until_terminal(store_id, timeout).is_completed()
    }
}
