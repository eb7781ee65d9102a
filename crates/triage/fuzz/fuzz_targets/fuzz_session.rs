//! Fuzz target for session navigation.
//!
//! Drives a session with arbitrary commands and checks the cursor never leaves the
//! table.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use triage::input::RawTable;
use triage::{AnnotationSession, ColumnNames, LabelSet, Table};

#[derive(Debug, Arbitrary)]
enum Command {
    Annotate(u8),
    Skip,
    Note(String),
    Next,
    Previous,
    Jump(u16),
    NextSkipped,
}

#[derive(Debug, Arbitrary)]
struct Input {
    rows: u8,
    commands: Vec<Command>,
}

fuzz_target!(|input: Input| {
    let rows = usize::from(input.rows);
    let labels = LabelSet::parse("a,b,c").unwrap();

    let raw = RawTable::new(
        vec!["body".to_string()],
        (0..rows).map(|i| vec![Some(i.to_string())]).collect(),
        b',',
    );
    let mut session = AnnotationSession::new(labels.clone());
    session.load(Table::from_raw(raw, &ColumnNames::default(), Some(&labels)));

    for command in &input.commands {
        let _ = match command {
            Command::Annotate(i) => {
                let label = labels.get(usize::from(*i) % labels.len()).unwrap();
                session.annotate(label).map(|_| ())
            }
            Command::Skip => session.skip().map(|_| ()),
            Command::Note(text) => session.set_note(text).map(|_| ()),
            Command::Next => session.next_row().map(|_| ()),
            Command::Previous => session.previous_row().map(|_| ()),
            Command::Jump(row) => session.jump_to(usize::from(*row)).map(|_| ()),
            Command::NextSkipped => session
                .next_skipped_after_cursor()
                .and_then(|p| session.jump_to_skipped(p)),
        };

        match session.cursor() {
            Some(cursor) => assert!(cursor < rows),
            None => assert_eq!(rows, 0),
        }
    }
});
