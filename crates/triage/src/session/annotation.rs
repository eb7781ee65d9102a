//! The labeling state machine: cursor, skipped set, and cell mutations.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::config::LabelSet;
use crate::error::{Result, TriageError};
use crate::table::{Row, Table, is_missing_token};

use super::event::MutationEvent;
use super::stats::SessionStats;

/// In-memory labeling session over one table.
///
/// Invariants while a table is loaded:
/// - the cursor is `Some(p)` with `p < row_count`, or `None` for an empty table;
/// - `skipped` holds exactly the positions whose skip flag is set;
/// - `annotated` equals the number of rows with a label.
#[derive(Debug)]
pub struct AnnotationSession {
    labels: LabelSet,
    table: Option<Table>,
    cursor: Option<usize>,
    skipped: BTreeSet<usize>,
    annotated: usize,
}

impl AnnotationSession {
    /// Create an empty session for a fixed label vocabulary.
    pub fn new(labels: LabelSet) -> Self {
        Self {
            labels,
            table: None,
            cursor: None,
            skipped: BTreeSet::new(),
            annotated: 0,
        }
    }

    /// Install a table, discarding any previous one.
    ///
    /// The cursor resumes at the first unlabeled row, or the first row when every
    /// row is labeled.
    pub fn load(&mut self, table: Table) {
        self.skipped = table.skipped_positions().collect();
        self.annotated = table.annotated_count();
        self.cursor = if table.is_empty() {
            None
        } else {
            Some(table.first_unannotated().unwrap_or(0))
        };

        tracing::debug!(
            rows = table.row_count(),
            annotated = self.annotated,
            skipped = self.skipped.len(),
            cursor = ?self.cursor,
            "session loaded"
        );
        self.table = Some(table);
    }

    /// Whether a table is installed.
    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Current position, `None` when no table is loaded or it is empty.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn row_count(&self) -> usize {
        self.table.as_ref().map_or(0, Table::row_count)
    }

    /// The row under the cursor.
    pub fn current_row(&self) -> Result<Row<'_>> {
        let (table, position) = self.current()?;
        table
            .row(position)
            .ok_or_else(|| TriageError::NoData(format!("row {} does not exist", position + 1)))
    }

    /// Whether `position` is set aside for later.
    pub fn is_skipped(&self, position: usize) -> bool {
        self.skipped.contains(&position)
    }

    /// Skipped positions, ascending.
    pub fn skipped_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.skipped.iter().copied()
    }

    /// Label the current row and move on.
    ///
    /// Labeling a skipped row clears its skip flag.
    pub fn annotate(&mut self, label: &str) -> Result<MutationEvent> {
        if !self.labels.contains(label) {
            return Err(TriageError::InvalidLabel {
                label: label.to_string(),
                expected: self.labels.joined(),
            });
        }
        let position = self.require_cursor()?;
        let table = self.table_mut()?;

        let was_annotated = table.annotation(position).is_some();
        table.set_annotation(position, Some(label.to_string()));
        if self.skipped.remove(&position) {
            self.table_mut()?.set_skipped(position, false);
        }
        if !was_annotated {
            self.annotated += 1;
        }
        self.advance();

        Ok(MutationEvent::Annotated {
            position,
            label: label.to_string(),
            annotated_count: self.annotated,
        })
    }

    /// Set the current row's note; blank text clears it. The cursor does not move.
    ///
    /// Text that would read back as a missing value is cleared here too, so the
    /// in-memory note always matches what a reload produces.
    pub fn set_note(&mut self, text: &str) -> Result<MutationEvent> {
        let position = self.require_cursor()?;
        let note = (!is_missing_token(text)).then(|| text.to_string());
        self.table_mut()?.set_note(position, note);

        Ok(MutationEvent::NoteChanged { position })
    }

    /// Set the current row aside for later and move on.
    pub fn skip(&mut self) -> Result<MutationEvent> {
        let position = self.require_cursor()?;
        self.table_mut()?.set_skipped(position, true);
        self.skipped.insert(position);
        self.advance();

        Ok(MutationEvent::Skipped { position })
    }

    /// Move forward one row; stays put on the last row.
    pub fn next_row(&mut self) -> Result<usize> {
        self.require_cursor()?;
        self.advance();
        self.require_cursor()
    }

    /// Move back one row; stays put on the first row.
    pub fn previous_row(&mut self) -> Result<usize> {
        let position = self.require_cursor()?;
        let position = position.saturating_sub(1);
        self.cursor = Some(position);
        Ok(position)
    }

    /// Jump to a 1-based row number.
    pub fn jump_to(&mut self, row: usize) -> Result<usize> {
        if self.table.is_none() {
            return Err(no_table());
        }
        let row_count = self.row_count();
        if row == 0 || row > row_count {
            return Err(TriageError::OutOfRange { row, row_count });
        }
        self.cursor = Some(row - 1);
        tracing::debug!(row, "jumped");
        Ok(row - 1)
    }

    /// Jump to a skipped position.
    pub fn jump_to_skipped(&mut self, position: usize) -> Result<()> {
        if self.table.is_none() {
            return Err(no_table());
        }
        if !self.skipped.contains(&position) {
            return Err(TriageError::NotSkipped { position });
        }
        self.cursor = Some(position);
        Ok(())
    }

    /// The first skipped position after the cursor, wrapping to the lowest one.
    pub fn next_skipped_after_cursor(&self) -> Result<usize> {
        let first = self.skipped.first().copied().ok_or(TriageError::NoSkipped)?;
        let after = self
            .cursor
            .and_then(|c| self.skipped.range(c + 1..).next().copied());
        Ok(after.unwrap_or(first))
    }

    /// Labeled, total and skipped counts.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            annotated: self.annotated,
            total: self.row_count(),
            skipped: self.skipped.len(),
        }
    }

    /// Row counts per label: vocabulary labels first (including zeros), then any
    /// other values found in the file.
    pub fn label_distribution(&self) -> IndexMap<String, usize> {
        let mut counts: IndexMap<String, usize> =
            self.labels.iter().map(|l| (l.to_string(), 0)).collect();

        if let Some(table) = &self.table {
            for position in 0..table.row_count() {
                if let Some(label) = table.annotation(position) {
                    *counts.entry(label.to_string()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    fn current(&self) -> Result<(&Table, usize)> {
        let table = self.table.as_ref().ok_or_else(no_table)?;
        let position = self
            .cursor
            .ok_or_else(|| TriageError::NoData("the table has no rows".to_string()))?;
        Ok((table, position))
    }

    fn require_cursor(&self) -> Result<usize> {
        self.current().map(|(_, position)| position)
    }

    fn table_mut(&mut self) -> Result<&mut Table> {
        self.table.as_mut().ok_or_else(no_table)
    }

    /// Step forward unless on the last row.
    fn advance(&mut self) {
        let row_count = self.row_count();
        if let Some(cursor) = self.cursor {
            if cursor + 1 < row_count {
                self.cursor = Some(cursor + 1);
            }
        }
    }
}

fn no_table() -> TriageError {
    TriageError::NoData("no table loaded".to_string())
}
