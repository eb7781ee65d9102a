//! The in-memory table with its managed annotation, note and skip columns.

use indexmap::{IndexMap, IndexSet};

use crate::config::{ColumnNames, LabelSet};
use crate::input::RawTable;

use super::normalize::{
    normalize_annotation, normalize_note, parse_skip_flag, skip_flag_text,
};

/// Indices of the managed columns within a table's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ManagedColumns {
    annotation: usize,
    note: usize,
    skip: usize,
}

/// A loaded dataset.
///
/// Every row has exactly one cell per field. Cells are three-state: present text,
/// present but empty (`Some("")`), or absent (`None`). The annotation, note and skip
/// columns always exist and are normalized on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    fields: IndexSet<String>,
    rows: Vec<Vec<Option<String>>>,
    columns: ManagedColumns,
    delimiter: u8,
}

impl Table {
    /// Build a table from parsed data, adding and normalizing the managed columns.
    ///
    /// `labels` protects exact vocabulary labels from being read as missing-value
    /// tokens (a label called `nan`, for instance).
    pub fn from_raw(raw: RawTable, names: &ColumnNames, labels: Option<&LabelSet>) -> Self {
        let RawTable {
            headers,
            mut rows,
            delimiter,
            ..
        } = raw;
        let mut fields: IndexSet<String> = headers.into_iter().collect();

        let mut ensure = |name: &str, rows: &mut Vec<Vec<Option<String>>>| -> usize {
            if let Some(index) = fields.get_index_of(name) {
                return index;
            }
            tracing::debug!(column = name, "adding missing column");
            let (index, _) = fields.insert_full(name.to_string());
            for row in rows.iter_mut() {
                row.push(None);
            }
            index
        };

        let columns = ManagedColumns {
            annotation: ensure(&names.annotation, &mut rows),
            note: ensure(&names.note, &mut rows),
            skip: ensure(&names.skip, &mut rows),
        };

        for row in rows.iter_mut() {
            let annotation = row[columns.annotation].take();
            row[columns.annotation] = normalize_annotation(annotation, labels);

            let note = row[columns.note].take();
            row[columns.note] = normalize_note(note);

            let skipped = parse_skip_flag(row[columns.skip].as_deref());
            row[columns.skip] = Some(skip_flag_text(skipped).to_string());
        }

        Self {
            fields,
            rows,
            columns,
            delimiter,
        }
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the number of fields.
    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    /// Field names in declared order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|s| s.as_str())
    }

    /// Position of a field.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.get_index_of(name)
    }

    /// Delimiter the table was read with; reused when writing.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Raw cells of every row, in load order.
    pub fn records(&self) -> impl Iterator<Item = &[Option<String>]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// View of the row at `position`.
    pub fn row(&self, position: usize) -> Option<Row<'_>> {
        self.rows.get(position).map(|values| Row {
            position,
            fields: &self.fields,
            values,
            primary: self.primary_field(),
        })
    }

    /// Get a cell by row position and field name. Absent cells return `None`.
    pub fn cell(&self, position: usize, field: &str) -> Option<&str> {
        let col = self.fields.get_index_of(field)?;
        self.rows.get(position)?.get(col)?.as_deref()
    }

    /// Label of a row, if it has one.
    pub fn annotation(&self, position: usize) -> Option<&str> {
        self.managed(position, self.columns.annotation)
    }

    /// Note of a row, if it has one.
    pub fn note(&self, position: usize) -> Option<&str> {
        self.managed(position, self.columns.note)
    }

    /// Whether a row's skip flag is set.
    pub fn is_skipped(&self, position: usize) -> bool {
        self.managed(position, self.columns.skip) == Some(skip_flag_text(true))
    }

    /// # Panics
    ///
    /// Panics if `position` is out of range.
    pub fn set_annotation(&mut self, position: usize, label: Option<String>) {
        self.rows[position][self.columns.annotation] = label;
    }

    /// # Panics
    ///
    /// Panics if `position` is out of range.
    pub fn set_note(&mut self, position: usize, note: Option<String>) {
        self.rows[position][self.columns.note] = note;
    }

    /// # Panics
    ///
    /// Panics if `position` is out of range.
    pub fn set_skipped(&mut self, position: usize, skipped: bool) {
        self.rows[position][self.columns.skip] = Some(skip_flag_text(skipped).to_string());
    }

    /// Number of rows with a label.
    pub fn annotated_count(&self) -> usize {
        (0..self.rows.len())
            .filter(|&p| self.annotation(p).is_some())
            .count()
    }

    /// First row without a label, scanning in load order.
    pub fn first_unannotated(&self) -> Option<usize> {
        (0..self.rows.len()).find(|&p| self.annotation(p).is_none())
    }

    /// Positions whose skip flag is set, ascending.
    pub fn skipped_positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.rows.len()).filter(|&p| self.is_skipped(p))
    }

    /// Index of the first field that is not a managed column.
    pub fn primary_field(&self) -> Option<usize> {
        let ManagedColumns {
            annotation,
            note,
            skip,
        } = self.columns;
        (0..self.fields.len()).find(|&i| i != annotation && i != note && i != skip)
    }

    fn managed(&self, position: usize, col: usize) -> Option<&str> {
        self.rows.get(position).and_then(|r| r[col].as_deref())
    }
}

/// Borrowed view of one row: an ordered field → value mapping.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    position: usize,
    fields: &'a IndexSet<String>,
    values: &'a [Option<String>],
    primary: Option<usize>,
}

impl<'a> Row<'a> {
    /// 0-based position in load order.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Value of a field. `None` when the field is absent or unknown.
    pub fn get(&self, field: &str) -> Option<&'a str> {
        let col = self.fields.get_index_of(field)?;
        self.values[col].as_deref()
    }

    /// Value of the first data field (skipping managed columns); the message body
    /// in typical datasets.
    pub fn primary_text(&self) -> Option<&'a str> {
        self.primary
            .and_then(|col| self.values.get(col))
            .and_then(|v| v.as_deref())
    }

    /// Fields and values in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Option<&'a str>)> + 'a {
        let fields: &'a IndexSet<String> = self.fields;
        let values = self.values;
        fields
            .iter()
            .zip(values.iter())
            .map(|(f, v)| (f.as_str(), v.as_deref()))
    }

    /// Owned copy of the row.
    pub fn to_map(&self) -> IndexMap<String, Option<String>> {
        self.fields
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[Option<&str>]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| v.map(str::to_string)).collect())
                .collect(),
            b',',
        )
    }

    #[test]
    fn test_managed_columns_added() {
        let table = Table::from_raw(
            raw(&["body"], &[&[Some("hello")], &[Some("bye")]]),
            &ColumnNames::default(),
            None,
        );

        assert_eq!(
            table.field_names().collect::<Vec<_>>(),
            vec!["body", "annotation", "note", "skipped"]
        );
        assert_eq!(table.annotation(0), None);
        assert_eq!(table.note(1), None);
        assert!(!table.is_skipped(0));
        assert_eq!(table.cell(0, "skipped"), Some("0"));
    }

    #[test]
    fn test_existing_columns_normalized() {
        let table = Table::from_raw(
            raw(
                &["body", "skipped", "annotation", "note"],
                &[
                    &[Some("a"), Some("1.0"), Some("Spam"), Some("nan")],
                    &[Some("b"), Some("junk"), Some(""), Some("keep me")],
                ],
            ),
            &ColumnNames::default(),
            None,
        );

        // Existing column order is kept
        assert_eq!(table.field_index("skipped"), Some(1));
        assert!(table.is_skipped(0));
        assert!(!table.is_skipped(1));
        assert_eq!(table.cell(1, "skipped"), Some("0"));
        assert_eq!(table.annotation(0), Some("Spam"));
        assert_eq!(table.annotation(1), None);
        assert_eq!(table.note(0), None);
        assert_eq!(table.note(1), Some("keep me"));
    }

    #[test]
    fn test_other_fields_untouched() {
        let table = Table::from_raw(
            raw(&["body", "n"], &[&[Some("NA"), Some("")]]),
            &ColumnNames::default(),
            None,
        );

        assert_eq!(table.cell(0, "body"), Some("NA"));
        assert_eq!(table.cell(0, "n"), Some(""));
    }

    #[test]
    fn test_counts_and_scans() {
        let mut table = Table::from_raw(
            raw(&["body"], &[&[Some("a")], &[Some("b")], &[Some("c")]]),
            &ColumnNames::default(),
            None,
        );
        assert_eq!(table.first_unannotated(), Some(0));

        table.set_annotation(0, Some("x".into()));
        table.set_annotation(2, Some("y".into()));
        table.set_skipped(1, true);

        assert_eq!(table.annotated_count(), 2);
        assert_eq!(table.first_unannotated(), Some(1));
        assert_eq!(table.skipped_positions().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_row_view() {
        let table = Table::from_raw(
            raw(&["body", "from"], &[&[Some("hi"), None]]),
            &ColumnNames::default(),
            None,
        );
        let row = table.row(0).unwrap();

        assert_eq!(row.position(), 0);
        assert_eq!(row.primary_text(), Some("hi"));
        assert_eq!(row.get("from"), None);
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.iter().count(), 5);
        assert_eq!(row.to_map().get("body"), Some(&Some("hi".to_string())));
        assert!(table.row(1).is_none());
    }

    #[test]
    fn test_primary_text_skips_managed_columns() {
        let table = Table::from_raw(
            raw(&["annotation", "note", "body"], &[&[Some("Spam"), None, Some("hi")]]),
            &ColumnNames::default(),
            None,
        );

        assert_eq!(table.primary_field(), Some(2));
        assert_eq!(table.row(0).unwrap().primary_text(), Some("hi"));
    }

    #[test]
    fn test_primary_text_without_data_fields() {
        let table = Table::from_raw(
            raw(&["annotation"], &[&[Some("Spam")]]),
            &ColumnNames::default(),
            None,
        );

        assert_eq!(table.primary_field(), None);
        assert_eq!(table.row(0).unwrap().primary_text(), None);
    }
}
