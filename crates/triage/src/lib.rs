//! Triage: resumable manual labeling of tabular datasets.
//!
//! Triage drives a single-user labeling pass over a delimited file (typically one
//! email per row): pick a label from a fixed vocabulary, attach a note, or set the row
//! aside for later. Progress lives in three columns of the file itself, so reopening
//! the file resumes at the first unlabeled row.
//!
//! # Core Pieces
//!
//! - [`TableStore`] reads and writes the file and normalizes the managed columns
//! - [`AnnotationSession`] is the cursor/skip/label state machine
//! - [`PersistencePolicy`] decides when mutations are written back
//! - [`Annotator`] ties them together for a front end
//!
//! # Example
//!
//! ```no_run
//! use triage::{Annotator, AnnotatorConfig, LabelSet};
//!
//! let labels = LabelSet::parse("Deceptive, Targeted, Extortion/Blackmail").unwrap();
//! let mut annotator = Annotator::new(AnnotatorConfig::new(labels)).unwrap();
//! annotator.load_file("emails.csv").unwrap();
//!
//! let row = annotator.display_row().unwrap();
//! println!("Row {} / {}", row.row_number, row.row_count);
//!
//! annotator.choose_label("Targeted").unwrap();
//! annotator.manual_save().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod persistence;
pub mod session;
pub mod store;
pub mod table;

mod annotator;

pub use crate::annotator::{Annotator, DisplayRow};
pub use config::{AnnotatorConfig, ColumnNames, DEFAULT_LABELS_PROMPT, LabelSet};
pub use error::{Result, TriageError};
pub use input::{ParserConfig, SourceMetadata, TextEncoding};
pub use persistence::{PersistencePolicy, SaveReason};
pub use session::{AnnotationSession, MutationEvent, SessionStats};
pub use store::TableStore;
pub use table::{Row, Table};
