//! Application layer - use cases and orchestration.
//!
//! This layer contains the export pipeline and the vector store
//! lifecycle operations.

pub mod export_service;
pub mod formatter;
pub mod normalizer;
pub mod sorter;
pub mod statistics;
pub mod vector_store_manager;

pub use export_service::{default_export_path, save_outcome, ExportOutcome, ExportService};
pub use formatter::{
    format_collections_table, format_stats, format_store_info, format_stores_table, OutputFormat,
};
pub use vector_store_manager::{expand_upload_paths, ManagerTiming, VectorStoreManager};
