//! Fuzz target for loading files.
//!
//! Loading arbitrary bytes must either fail with an error or produce a table that
//! survives a save and reload with the same shape.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Write;
use triage::TableStore;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let Ok(mut temp_file) = tempfile::NamedTempFile::new() else {
        return;
    };
    if temp_file.write_all(data).is_err() {
        return;
    }

    let store = TableStore::new();
    let Ok((table, _)) = store.load(temp_file.path()) else {
        return;
    };

    if store.save(&table, temp_file.path()).is_ok() {
        if let Ok((reloaded, _)) = store.load(temp_file.path()) {
            assert_eq!(reloaded.column_count(), table.column_count());
        }
    }
});
