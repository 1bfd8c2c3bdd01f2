//! Infrastructure layer - external adapters (database, HTTP, filesystem).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod json_dump_source;
pub mod json_writer;
pub mod mongo_source;
pub mod openai_client;

pub use config::{ensure_config_exists, load_config, render_config};
pub use json_dump_source::JsonDumpSource;
pub use json_writer::write_json_atomic;
pub use mongo_source::{database_from_uri, CollectionInfo, MongoSessionSource};
pub use openai_client::OpenAiVectorStoreClient;
