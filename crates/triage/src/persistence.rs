//! When to write the session's table back to disk.
//!
//! The policy is fed every [`MutationEvent`] and answers whether a save is due. It
//! also runs saves on the caller's behalf so that failures are handled by one rule:
//! automatic saves log and carry on, manual saves return the error.

use chrono::{DateTime, Utc};

use crate::config::DEFAULT_AUTOSAVE_EVERY;
use crate::error::Result;
use crate::session::MutationEvent;

/// Why a save is happening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveReason {
    /// Persist columns added during load.
    LoadNormalization,
    /// Annotated count reached a multiple of the cadence.
    AutoSave,
    /// Requested by the user.
    Manual,
}

impl SaveReason {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            SaveReason::LoadNormalization => "load",
            SaveReason::AutoSave => "auto-save",
            SaveReason::Manual => "manual",
        }
    }

    /// Whether a failure should be returned to the caller rather than logged.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SaveReason::Manual)
    }
}

/// Decides when session mutations are flushed to disk.
#[derive(Debug, Clone)]
pub struct PersistencePolicy {
    autosave_every: usize,
    mutation_count: u64,
    saved_at_mutation: u64,
    save_count: usize,
    last_saved_at: Option<DateTime<Utc>>,
    last_failure: Option<String>,
}

impl PersistencePolicy {
    /// Create a policy that auto-saves every `autosave_every` annotated rows.
    ///
    /// A cadence of zero is treated as one.
    pub fn new(autosave_every: usize) -> Self {
        Self {
            autosave_every: autosave_every.max(1),
            mutation_count: 0,
            saved_at_mutation: 0,
            save_count: 0,
            last_saved_at: None,
            last_failure: None,
        }
    }

    /// Record a mutation and decide whether it calls for a save.
    ///
    /// Only label writes can trigger an auto-save, and only when the annotated
    /// count lands on a multiple of the cadence. Notes and skips never do.
    pub fn observe(&mut self, event: &MutationEvent) -> Option<SaveReason> {
        self.mutation_count += 1;

        let due = match event {
            MutationEvent::Annotated {
                annotated_count, ..
            } => *annotated_count > 0 && annotated_count % self.autosave_every == 0,
            MutationEvent::NoteChanged { .. } | MutationEvent::Skipped { .. } => false,
        };

        tracing::debug!(
            event = event.label(),
            position = event.position(),
            mutations = self.mutation_count,
            due,
            "observed mutation"
        );

        due.then_some(SaveReason::AutoSave)
    }

    /// Mark the in-memory state as matching disk, e.g. right after a load.
    pub fn mark_clean(&mut self) {
        self.saved_at_mutation = self.mutation_count;
        self.last_failure = None;
    }

    /// Run `save` for `reason`.
    ///
    /// Returns `Ok(true)` if the save succeeded and `Ok(false)` if a non-fatal save
    /// failed (the failure is logged and kept in [`last_failure`](Self::last_failure)).
    /// Manual save failures are returned as errors.
    pub fn flush<F>(&mut self, reason: SaveReason, save: F) -> Result<bool>
    where
        F: FnOnce() -> Result<()>,
    {
        match save() {
            Ok(()) => {
                self.save_count += 1;
                self.last_saved_at = Some(Utc::now());
                self.mark_clean();
                tracing::debug!(reason = reason.label(), saves = self.save_count, "flushed");
                Ok(true)
            }
            Err(e) if reason.is_fatal() => {
                self.last_failure = Some(e.to_string());
                Err(e)
            }
            Err(e) => {
                tracing::warn!(reason = reason.label(), error = %e, "save failed; continuing with unsaved changes");
                self.last_failure = Some(e.to_string());
                Ok(false)
            }
        }
    }

    /// Total mutations observed. Never decreases.
    pub fn mutation_count(&self) -> u64 {
        self.mutation_count
    }

    /// Whether mutations happened since the last successful save or load.
    pub fn has_unsaved_changes(&self) -> bool {
        self.mutation_count > self.saved_at_mutation
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.save_count
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    /// Message of the most recent failed save, cleared by the next success.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn autosave_every(&self) -> usize {
        self.autosave_every
    }
}

impl Default for PersistencePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSAVE_EVERY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriageError;

    fn annotated(count: usize) -> MutationEvent {
        MutationEvent::Annotated {
            position: count - 1,
            label: "x".into(),
            annotated_count: count,
        }
    }

    #[test]
    fn test_autosave_cadence() {
        let mut policy = PersistencePolicy::default();
        let due: Vec<usize> = (1..=25)
            .filter(|&n| policy.observe(&annotated(n)).is_some())
            .collect();

        assert_eq!(due, vec![10, 20]);
        assert_eq!(policy.mutation_count(), 25);
    }

    #[test]
    fn test_notes_and_skips_never_trigger() {
        let mut policy = PersistencePolicy::new(1);
        assert!(policy.observe(&MutationEvent::Skipped { position: 0 }).is_none());
        assert!(policy.observe(&MutationEvent::NoteChanged { position: 0 }).is_none());
        assert!(policy.observe(&annotated(1)).is_some());
        assert_eq!(policy.mutation_count(), 3);
    }

    #[test]
    fn test_unsaved_changes() {
        let mut policy = PersistencePolicy::default();
        assert!(!policy.has_unsaved_changes());

        policy.observe(&MutationEvent::Skipped { position: 0 });
        assert!(policy.has_unsaved_changes());

        assert!(policy.flush(SaveReason::Manual, || Ok(())).unwrap());
        assert!(!policy.has_unsaved_changes());
        assert_eq!(policy.save_count(), 1);
        assert!(policy.last_saved_at().is_some());
    }

    #[test]
    fn test_autosave_failure_is_swallowed() {
        let mut policy = PersistencePolicy::default();
        policy.observe(&annotated(1));

        let saved = policy
            .flush(SaveReason::AutoSave, || Err(TriageError::NoSkipped))
            .unwrap();

        assert!(!saved);
        assert!(policy.has_unsaved_changes());
        assert!(policy.last_failure().is_some());
        assert_eq!(policy.save_count(), 0);
    }

    #[test]
    fn test_manual_failure_is_returned() {
        let mut policy = PersistencePolicy::default();
        let result = policy.flush(SaveReason::Manual, || {
            Err(TriageError::save("x.csv", std::io::Error::other("disk full")))
        });

        assert!(matches!(result, Err(TriageError::Save { .. })));
        assert!(policy.last_failure().unwrap().contains("disk full"));
    }

    #[test]
    fn test_zero_cadence_clamped() {
        assert_eq!(PersistencePolicy::new(0).autosave_every(), 1);
    }
}
