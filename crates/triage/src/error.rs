//! Error types for the Triage library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Triage operations.
#[derive(Debug, Error)]
pub enum TriageError {
    /// Invalid or missing configuration (empty label vocabulary, bad column names).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The data file could not be read, decoded, or parsed.
    #[error("Failed to load '{path}': {message}")]
    Load { path: PathBuf, message: String },

    /// The data file could not be written.
    #[error("Failed to save '{path}': {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file changed on disk since it was last loaded or saved.
    #[error("'{path}' was modified by another program since it was last read")]
    ExternallyModified { path: PathBuf },

    /// The label is not part of the configured vocabulary.
    #[error("Invalid label '{label}' (expected one of: {expected})")]
    InvalidLabel { label: String, expected: String },

    /// A 1-based row number outside the table.
    #[error("Row {row} is out of range (1..={row_count})")]
    OutOfRange { row: usize, row_count: usize },

    /// Jump target is not in the skipped set.
    #[error("Row {} is not marked as skipped", .position + 1)]
    NotSkipped { position: usize },

    /// No rows are marked as skipped.
    #[error("No skipped rows")]
    NoSkipped,

    /// No table is loaded, or the loaded table has no rows.
    #[error("No data: {0}")]
    NoData(String),
}

impl TriageError {
    /// Build a load error for `path`.
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        TriageError::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build a save error for `path`.
    pub fn save(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TriageError::Save {
            path: path.into(),
            source,
        }
    }

    /// Short stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            TriageError::Config(_) => "config",
            TriageError::Load { .. } => "load",
            TriageError::Save { .. } => "save",
            TriageError::ExternallyModified { .. } => "externally_modified",
            TriageError::InvalidLabel { .. } => "invalid_label",
            TriageError::OutOfRange { .. } => "out_of_range",
            TriageError::NotSkipped { .. } => "not_skipped",
            TriageError::NoSkipped => "no_skipped",
            TriageError::NoData(_) => "no_data",
        }
    }

    /// Whether the session remains usable after this error.
    ///
    /// Only configuration errors halt startup.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TriageError::Config(_))
    }
}

/// Result type alias for Triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;
