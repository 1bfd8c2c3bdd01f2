//! Seams between the application layer and its external collaborators.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::error::Result;
use super::models::{RawSession, SourceLocation};
use super::vector_store::{UploadedFile, VectorStore};

/// A collection of raw session documents.
pub trait SessionSource {
    /// Return every stored session, unfiltered.
    ///
    /// # Errors
    /// Returns `Connectivity` if the store cannot be read.
    fn fetch_all(&self) -> Result<Vec<RawSession>>;

    /// Database/collection names written into the export metadata.
    fn location(&self) -> SourceLocation;
}

/// The remote vector store service.
pub trait VectorStoreApi {
    /// # Errors
    /// Returns `Api` on transport or HTTP failure.
    fn create_store(&self, name: &str, description: Option<&str>) -> Result<VectorStore>;

    /// # Errors
    /// Returns `Api` on transport or HTTP failure.
    fn retrieve_store(&self, store_id: &str) -> Result<VectorStore>;

    /// # Errors
    /// Returns `Api` on transport or HTTP failure.
    fn list_stores(&self) -> Result<Vec<VectorStore>>;

    /// Upload a local file for retrieval use.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read, `Api` on HTTP failure.
    fn upload_file(&self, path: &Path) -> Result<UploadedFile>;

    /// Attach an uploaded file to a store.
    ///
    /// # Errors
    /// Returns `Api` on transport or HTTP failure.
    fn attach_file(&self, store_id: &str, file_id: &str) -> Result<()>;
}

/// Wall clock and blocking sleep, injectable for tests.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration);
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
