//! Data source metadata and the raw parsed table.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::encoding::TextEncoding;

/// Metadata about a data file as it was read or written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Encoding the contents were decoded with.
    pub encoding: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was read or written.
    pub recorded_at: DateTime<Utc>,
}

impl SourceMetadata {
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        encoding: TextEncoding,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            encoding: encoding.name().to_string(),
            row_count,
            column_count,
            recorded_at: Utc::now(),
        }
    }
}

/// Parsed delimited data before normalization.
///
/// `None` cells are fields the record did not have; `Some("")` cells were present
/// but empty.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Column headers, unique.
    pub headers: Vec<String>,
    /// Row data (row-major order), each row exactly `headers.len()` long.
    pub rows: Vec<Vec<Option<String>>>,
    /// The delimiter used.
    pub delimiter: u8,
    /// The encoding the text was decoded with.
    pub encoding: TextEncoding,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>, delimiter: u8) -> Self {
        Self {
            headers,
            rows,
            delimiter,
            encoding: TextEncoding::Utf8,
        }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).and_then(|v| v.as_deref())
    }
}
