//! Annotation session: the resumable row-labeling state machine.
//!
//! Every mutating call returns a [`MutationEvent`] describing what changed, which
//! the persistence policy consumes to decide when to write the table back.
//!
//! # Usage
//!
//! ```no_run
//! use triage::{AnnotationSession, LabelSet, TableStore};
//!
//! let labels = LabelSet::parse("spam, ham").unwrap();
//! let store = TableStore::new().with_labels(labels.clone());
//! let (table, _source) = store.load("mail.csv").unwrap();
//!
//! let mut session = AnnotationSession::new(labels);
//! session.load(table);
//!
//! session.annotate("spam").unwrap();
//! session.skip().unwrap();
//! println!("{:?}", session.stats());
//! ```

mod annotation;
mod event;
mod stats;

pub use annotation::AnnotationSession;
pub use event::MutationEvent;
pub use stats::SessionStats;
