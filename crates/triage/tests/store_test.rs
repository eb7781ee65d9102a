//! Integration tests for loading and saving tables.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use triage::{
    ColumnNames, LabelSet, ParserConfig, Table, TableStore, TextEncoding, TriageError,
};

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).expect("Failed to write test file");
    path
}

fn load(path: &Path) -> Table {
    TableStore::new().load(path).expect("Load failed").0
}

/// Every non-managed cell, by field name, for comparison across reloads.
fn data_cells(table: &Table, fields: &[&str]) -> Vec<Vec<Option<String>>> {
    (0..table.row_count())
        .map(|p| {
            fields
                .iter()
                .map(|f| table.cell(p, f).map(str::to_string))
                .collect()
        })
        .collect()
}

// =============================================================================
// Load Tests
// =============================================================================

#[test]
fn test_load_adds_managed_columns() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "mail.csv", b"body,sender\nhello,alice\n");

    let (table, source) = TableStore::new().load(&path).unwrap();

    assert_eq!(
        table.field_names().collect::<Vec<_>>(),
        vec!["body", "sender", "annotation", "note", "skipped"]
    );
    assert_eq!(source.row_count, 1);
    assert_eq!(source.column_count, 2);
    assert_eq!(source.format, "csv");
    assert_eq!(source.encoding, "utf-8");
    assert!(source.hash.starts_with("sha256:"));
}

#[test]
fn test_load_keeps_values_as_text() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "mail.csv", b"id,date,score\n007,2024-01-05,1e3\n");

    let table = load(&path);
    assert_eq!(table.cell(0, "id"), Some("007"));
    assert_eq!(table.cell(0, "date"), Some("2024-01-05"));
    assert_eq!(table.cell(0, "score"), Some("1e3"));
}

#[test]
fn test_load_latin1_fallback() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "legacy.csv", b"body\nR\xE9sum\xE9 attached\n");

    let (table, source) = TableStore::new().load(&path).unwrap();
    assert_eq!(table.cell(0, "body"), Some("Résumé attached"));
    assert_eq!(source.encoding, "latin-1");
}

#[test]
fn test_load_fails_when_both_encodings_fail() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "broken.csv", b"body\n\xFF\x81\n");

    let parser = ParserConfig {
        fallback_encoding: TextEncoding::Windows1252,
        ..ParserConfig::default()
    };
    let store = TableStore::with_config(ColumnNames::default(), parser);

    assert!(matches!(store.load(&path), Err(TriageError::Load { .. })));
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = TableStore::new().load(dir.path().join("nope.csv"));
    assert!(matches!(result, Err(TriageError::Load { .. })));
}

#[test]
fn test_load_malformed_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bad.csv", b"a,b\n1,2\n1,2,3\n");

    let err = TableStore::new().load(&path).unwrap_err();
    assert!(matches!(err, TriageError::Load { .. }));
    assert!(err.to_string().contains("expected 2"), "{}", err);
}

#[test]
fn test_load_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "empty.csv", b"");
    assert!(matches!(
        TableStore::new().load(&path),
        Err(TriageError::Load { .. })
    ));
}

#[test]
fn test_load_detects_tab_delimiter() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "mail.txt", b"body\tsender\nhi, all\tbob\n");

    let table = load(&path);
    assert_eq!(table.delimiter(), b'\t');
    assert_eq!(table.cell(0, "body"), Some("hi, all"));
}

#[test]
fn test_load_protects_vocabulary_labels() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "mail.csv", b"body,annotation\na,nan\nb,<NA>\nc,None\n");

    let labels = LabelSet::parse("nan, Spam").unwrap();
    let (table, _) = TableStore::new().with_labels(labels).load(&path).unwrap();

    assert_eq!(table.annotation(0), Some("nan"));
    assert_eq!(table.annotation(1), None);
    assert_eq!(table.annotation(2), Some("None"));
}

#[test]
fn test_custom_column_names() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "mail.csv", b"body,label\na,spam\n");

    let columns = ColumnNames {
        annotation: "label".to_string(),
        note: "comment".to_string(),
        skip: "later".to_string(),
    };
    let store = TableStore::with_config(columns, ParserConfig::default());
    let (table, _) = store.load(&path).unwrap();

    assert_eq!(table.annotation(0), Some("spam"));
    assert_eq!(
        table.field_names().collect::<Vec<_>>(),
        vec!["body", "label", "comment", "later"]
    );
}

// =============================================================================
// Save Tests
// =============================================================================

#[test]
fn test_save_then_reload_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let content = "body,sender,empty\n\"Dear user,\nclick here\",x@y.z,\nplain,,\n";
    let path = write_file(&dir, "mail.csv", content.as_bytes());

    let store = TableStore::new();
    let (original, _) = store.load(&path).unwrap();
    store.save(&original, &path).unwrap();
    let (reloaded, _) = store.load(&path).unwrap();

    let fields = ["body", "sender", "empty"];
    assert_eq!(data_cells(&original, &fields), data_cells(&reloaded, &fields));
    assert_eq!(
        reloaded.field_names().collect::<Vec<_>>(),
        original.field_names().collect::<Vec<_>>()
    );
    assert_eq!(reloaded.cell(0, "skipped"), Some("0"));
}

#[test]
fn test_round_trip_managed_columns() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "mail.tsv", b"body\na\nb\nc\n");

    let store = TableStore::new();
    let (mut table, _) = store.load(&path).unwrap();
    table.set_annotation(0, Some("spam".into()));
    table.set_note(1, Some("needs a second look".into()));
    table.set_skipped(1, true);
    store.save(&table, &path).unwrap();

    let (reloaded, _) = store.load(&path).unwrap();
    for p in 0..3 {
        assert_eq!(reloaded.annotation(p), table.annotation(p));
        assert_eq!(reloaded.note(p), table.note(p));
        assert_eq!(reloaded.is_skipped(p), table.is_skipped(p));
    }
    assert_eq!(reloaded.delimiter(), b'\t');
}

#[test]
fn test_save_does_not_write_row_index() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "mail.csv", b"body\nhello\n");

    let store = TableStore::new();
    let (table, _) = store.load(&path).unwrap();
    let out = dir.path().join("out.csv");
    store.save(&table, &out).unwrap();

    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().next(), Some("body,annotation,note,skipped"));
    assert_eq!(text.lines().nth(1), Some("hello,,,0"));
}

#[test]
fn test_save_latin1_file_as_utf8() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "legacy.csv", b"body\ncaf\xE9\n");

    let store = TableStore::new();
    let (table, _) = store.load(&path).unwrap();
    store.save(&table, &path).unwrap();

    let (reloaded, source) = store.load(&path).unwrap();
    assert_eq!(source.encoding, "utf-8");
    assert_eq!(reloaded.cell(0, "body"), Some("café"));
}

#[test]
fn test_failed_save_leaves_target_untouched() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "mail.csv", b"body\nhello\n");

    let store = TableStore::new();
    let (table, _) = store.load(&path).unwrap();

    // A directory in the way makes the final rename fail
    let blocked = dir.path().join("blocked.csv");
    fs::create_dir(&blocked).unwrap();
    fs::write(blocked.join("keep.txt"), b"keep").unwrap();

    let err = store.save(&table, &blocked).unwrap_err();
    assert!(matches!(err, TriageError::Save { .. }));
    assert!(blocked.join("keep.txt").exists());
    assert!(!dir.path().join(".blocked.csv.triage.tmp").exists());
}
