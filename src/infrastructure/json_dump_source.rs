//! Session source backed by a `mongoexport` dump.
//!
//! Accepts a JSON array, one document per line, or pretty-printed documents
//! one after another. Values use MongoDB Extended JSON, so `{"$date": ...}`
//! arrives as a native datetime just like a live read would.

use std::path::PathBuf;

use mongodb::bson::Bson;

use crate::domain::{AppError, RawSession, Result, SessionSource, SourceLocation};

/// Reads sessions from an exported JSON file.
#[derive(Debug, Clone)]
pub struct JsonDumpSource {
    path: PathBuf,
}

impl JsonDumpSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionSource for JsonDumpSource {
    fn fetch_all(&self) -> Result<Vec<RawSession>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::io(format!("Failed to read dump file {}", self.path.display()), e)
        })?;

        let sessions = parse_dump(&content)?;
        tracing::info!(
            path = %self.path.display(),
            "Loaded {} chat sessions from dump",
            sessions.len()
        );

        Ok(sessions)
    }

    fn location(&self) -> SourceLocation {
        SourceLocation {
            database: "json-dump".to_string(),
            collection: self.path.display().to_string(),
        }
    }
}

/// Parse dump content into raw sessions.
///
/// # Errors
/// Returns `JsonParse` for malformed JSON and `InvalidData` for entries that
/// are not documents.
pub fn parse_dump(content: &str) -> Result<Vec<RawSession>> {
    let mut values = Vec::new();
    for value in serde_json::Deserializer::from_str(content).into_iter::<serde_json::Value>() {
        match value.map_err(AppError::json_parse)? {
            serde_json::Value::Array(items) => values.extend(items),
            other => values.push(other),
        }
    }

    values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| match Bson::try_from(value) {
            Ok(Bson::Document(doc)) => Ok(RawSession(doc)),
            Ok(other) => Err(AppError::InvalidData {
                message: format!(
                    "dump entry {idx} is {:?}, expected a document",
                    other.element_type()
                ),
            }),
            Err(e) => Err(AppError::InvalidData {
                message: format!("dump entry {idx} is not valid extended JSON: {e}"),
            }),
        })
        .collect()
}
