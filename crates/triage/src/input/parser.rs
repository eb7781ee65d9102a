//! Delimited-text parser with encoding fallback and delimiter detection.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Result, TriageError};
use super::encoding::{TextEncoding, decode_with_fallback};
use super::source::{RawTable, SourceMetadata};

/// Delimiters to try when auto-detecting, in tie-break order.
const DELIMITERS: &[u8] = &[b',', b'\t', b';', b'|'];

/// Records sampled after the header when auto-detecting.
const SAMPLE_RECORDS: usize = 20;

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = infer from extension, then content).
    pub delimiter: Option<u8>,
    /// Quote character.
    pub quote: u8,
    /// Encoding tried when the file is not valid UTF-8.
    pub fallback_encoding: TextEncoding,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
            fallback_encoding: TextEncoding::Latin1,
        }
    }
}

/// Parses delimited text files into raw tables.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the raw table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(RawTable, SourceMetadata)> {
        let path = path.as_ref();

        let contents = fs::read(path).map_err(|e| TriageError::load(path, e.to_string()))?;

        let (text, encoding) =
            decode_with_fallback(&contents, TextEncoding::Utf8, self.config.fallback_encoding)
                .ok_or_else(|| {
                    TriageError::load(
                        path,
                        format!(
                            "file is neither valid {} nor valid {}",
                            TextEncoding::Utf8,
                            self.config.fallback_encoding
                        ),
                    )
                })?;

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => delimiter_for_path(path).unwrap_or_else(|| self.detect_delimiter(&text)),
        };

        let mut table = self
            .parse_str(&text, delimiter)
            .map_err(|message| TriageError::load(path, message))?;
        table.encoding = encoding;

        let source = SourceMetadata::new(
            path.to_path_buf(),
            hash_bytes(&contents),
            contents.len() as u64,
            format_name(delimiter),
            encoding,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, source))
    }

    /// Parse already-decoded text.
    ///
    /// Short rows are padded with absent values. Rows with more fields than the
    /// header cannot be attributed to columns and are rejected.
    pub fn parse_str(&self, text: &str, delimiter: u8) -> std::result::Result<RawTable, String> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| format!("unreadable header row: {}", e))?
            .iter()
            .map(|s| s.to_string())
            .collect();

        if headers.is_empty() {
            return Err("no header row found".to_string());
        }
        let headers = dedupe_headers(headers);
        let expected_cols = headers.len();

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result.map_err(|e| format!("malformed record {}: {}", row_idx + 1, e))?;

            if record.len() > expected_cols {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                return Err(format!(
                    "record {} (line {}) has {} fields, expected {}",
                    row_idx + 1,
                    line,
                    record.len(),
                    expected_cols
                ));
            }

            let mut row: Vec<Option<String>> =
                record.iter().map(|s| Some(s.to_string())).collect();
            row.resize(expected_cols, None);
            rows.push(row);
        }

        Ok(RawTable::new(headers, rows, delimiter))
    }

    /// Pick the delimiter under which the most sampled records fill the header
    /// width, then the widest header. Candidates whose records overflow the
    /// header are dropped. Defaults to comma.
    ///
    /// Records are read with the configured quote, so delimiters inside quoted
    /// message bodies (including multi-line ones) are not counted.
    fn detect_delimiter(&self, text: &str) -> u8 {
        let mut best = (b',', (0, 0));
        for &delimiter in DELIMITERS {
            match self.delimiter_fit(text, delimiter) {
                Some(fit) if fit > best.1 => best = (delimiter, fit),
                _ => {}
            }
        }
        let (delimiter, (full, width)) = best;
        tracing::debug!(format = %format_name(delimiter), width, full, "detected delimiter");
        delimiter
    }

    /// `(full_width_records, header_width)` for a candidate, or `None` if the
    /// header does not split or a sampled record overflows it.
    fn delimiter_fit(&self, text: &str, delimiter: u8) -> Option<(usize, usize)> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(text.as_bytes());

        let width = reader.headers().ok()?.len();
        if width < 2 {
            return None;
        }

        let mut full = 0;
        for record in reader.records().take(SAMPLE_RECORDS) {
            let record = record.ok()?;
            if record.len() > width {
                return None;
            }
            if record.len() == width {
                full += 1;
            }
        }
        Some((full, width))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA-256 of `bytes` in `sha256:<hex>` form.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Format name for a delimiter.
pub fn format_name(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
    .to_string()
}

/// Delimiter implied by a well-known file extension.
fn delimiter_for_path(path: &Path) -> Option<u8> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "tsv" | "tab" => Some(b'\t'),
        "csv" => Some(b','),
        _ => None,
    }
}

/// Make header names unique: repeats get `.1`, `.2`, ... suffixes.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", header, n);
            n += 1;
        }
        seen.push(name);
    }
    seen
}
