//! Reading and writing tables on disk.
//!
//! Writes go to a sibling temp file that is synced and then renamed over the
//! target, so a crash or I/O error mid-write leaves the previous file intact.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::{ColumnNames, LabelSet};
use crate::error::{Result, TriageError};
use crate::input::{Parser, ParserConfig, SourceMetadata, TextEncoding, format_name, hash_bytes};
use crate::table::Table;

/// Loads and saves tables, owning schema normalization.
pub struct TableStore {
    parser: Parser,
    columns: ColumnNames,
    labels: Option<LabelSet>,
}

impl TableStore {
    /// Create a store with default columns and parser settings.
    pub fn new() -> Self {
        Self::with_config(ColumnNames::default(), ParserConfig::default())
    }

    /// Create a store with custom column names and parser configuration.
    pub fn with_config(columns: ColumnNames, parser: ParserConfig) -> Self {
        Self {
            parser: Parser::with_config(parser),
            columns,
            labels: None,
        }
    }

    /// Protect these labels from missing-value normalization on load.
    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Managed column names.
    pub fn columns(&self) -> &ColumnNames {
        &self.columns
    }

    /// Read a delimited file into a normalized table.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(Table, SourceMetadata)> {
        let path = path.as_ref();
        let (raw, source) = self.parser.parse_file(path)?;
        let table = Table::from_raw(raw, &self.columns, self.labels.as_ref());

        tracing::info!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            encoding = %source.encoding,
            "loaded table"
        );

        Ok((table, source))
    }

    /// Write `table` to `path`, replacing any existing file atomically.
    ///
    /// Absent cells are written as empty fields. Returns metadata for the written
    /// file, including its hash.
    pub fn save(&self, table: &Table, path: impl AsRef<Path>) -> Result<SourceMetadata> {
        let path = path.as_ref();

        let bytes = serialize_table(table).map_err(|e| TriageError::save(path, e))?;
        write_atomic(path, &bytes).map_err(|e| TriageError::save(path, e))?;

        tracing::info!(path = %path.display(), rows = table.row_count(), "saved table");

        Ok(SourceMetadata::new(
            path.to_path_buf(),
            hash_bytes(&bytes),
            bytes.len() as u64,
            format_name(table.delimiter()),
            TextEncoding::Utf8,
            table.row_count(),
            table.column_count(),
        ))
    }
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash of the file currently at `path`, or `None` if it does not exist.
pub fn file_hash(path: impl AsRef<Path>) -> io::Result<Option<String>> {
    match fs::read(path.as_ref()) {
        Ok(bytes) => Ok(Some(hash_bytes(&bytes))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Serialize a table as UTF-8 delimited text with a header row.
fn serialize_table(table: &Table) -> io::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(table.delimiter())
        .from_writer(Vec::new());

    writer.write_record(table.field_names())?;
    for record in table.records() {
        writer.write_record(record.iter().map(|v| v.as_deref().unwrap_or("")))?;
    }

    writer.into_inner().map_err(|e| e.into_error())
}

/// Temp file used while writing `path`.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.triage.tmp", name))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(path);
    let result = (|| {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}
