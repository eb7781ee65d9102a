//! Mutation events emitted by the session.

use serde::{Deserialize, Serialize};

/// A change to exactly one row's managed cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationEvent {
    /// A label was written. `annotated_count` is the total after the write.
    Annotated {
        position: usize,
        label: String,
        annotated_count: usize,
    },
    /// The note was set or cleared.
    NoteChanged { position: usize },
    /// The row was set aside for later.
    Skipped { position: usize },
}

impl MutationEvent {
    /// Row the event touched.
    pub fn position(&self) -> usize {
        match self {
            MutationEvent::Annotated { position, .. }
            | MutationEvent::NoteChanged { position }
            | MutationEvent::Skipped { position } => *position,
        }
    }

    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            MutationEvent::Annotated { .. } => "annotated",
            MutationEvent::NoteChanged { .. } => "note_changed",
            MutationEvent::Skipped { .. } => "skipped",
        }
    }
}
