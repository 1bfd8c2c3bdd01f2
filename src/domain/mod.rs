//! Domain layer - core types, configuration and collaborator traits.
//!
//! This layer contains pure domain models and error types
//! without any I/O of its own.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
pub mod vector_store;

pub use config::{AppConfig, DatabaseConfig, VectorStoreConfig};
pub use error::{AppError, Result};
pub use models::{
    ConversationRecord, DateRange, ExportBundle, NormalizedMessage, RawSession, SkippedSession,
    SourceLocation, StatisticsReport, ROLE_ASSISTANT, ROLE_USER,
};
pub use ports::{Clock, SessionSource, SystemClock, VectorStoreApi};
pub use vector_store::{
    FileCounts, PollOutcome, UploadFailure, UploadReport, UploadedFile, VectorStore,
    VectorStoreStatus,
};
