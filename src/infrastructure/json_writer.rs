//! Atomic JSON file output.
//!
//! Data is written to a temporary file in the target directory and renamed
//! into place, so a failed run never leaves a truncated file at the target.

use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::domain::{AppError, Result};

/// Serialize `value` as pretty-printed UTF-8 JSON and move it to `path`.
///
/// Non-ASCII characters are written as-is.
///
/// # Errors
/// Returns `Io` if the file cannot be written or renamed, `JsonParse` if
/// serialization fails.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::io(format!("Failed to create directory {}", dir.display()), e))?;

    let temp = NamedTempFile::new_in(dir)
        .map_err(|e| AppError::io(format!("Failed to create temp file in {}", dir.display()), e))?;

    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, value).map_err(AppError::json_parse)?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|e| AppError::io("Failed to write export data", e))?;
    }

    temp.as_file()
        .sync_all()
        .map_err(|e| AppError::io("Failed to flush export data", e))?;

    // A dropped NamedTempFile removes itself, so error paths leave nothing behind.
    temp.persist(path)
        .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e.error))?;

    tracing::debug!(path = %path.display(), "Wrote JSON file");

    Ok(())
}
