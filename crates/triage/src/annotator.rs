//! The `Annotator`: one object a front end drives for a whole labeling run.
//!
//! It wires the session to the store through the persistence policy and tracks the
//! backing file, refusing to overwrite it if another program changed it meanwhile.

use std::path::{Path, PathBuf};

use crate::config::AnnotatorConfig;
use crate::error::{Result, TriageError};
use crate::input::SourceMetadata;
use crate::persistence::{PersistencePolicy, SaveReason};
use crate::session::{AnnotationSession, MutationEvent, SessionStats};
use crate::store::{TableStore, file_hash};
use crate::table::Row;

/// The file in-place saves go to.
#[derive(Debug)]
struct Backing {
    path: PathBuf,
    /// Metadata from the load, including the encoding the file was read in.
    source: SourceMetadata,
    /// Metadata of the most recent in-place save.
    written: Option<SourceMetadata>,
    /// Hash of the bytes we last read from or wrote to `path`.
    disk_hash: String,
}

/// Everything a front end needs to render the current row.
#[derive(Debug, Clone, Copy)]
pub struct DisplayRow<'a> {
    /// 0-based position.
    pub position: usize,
    /// 1-based row number.
    pub row_number: usize,
    pub row_count: usize,
    /// First non-managed field of the row (the message body).
    pub text: Option<&'a str>,
    pub row: Row<'a>,
    pub is_skipped: bool,
    pub annotation: Option<&'a str>,
    pub note: Option<&'a str>,
}

/// Labeling front-end contract: load, navigate, label, save.
pub struct Annotator {
    config: AnnotatorConfig,
    store: TableStore,
    session: AnnotationSession,
    policy: PersistencePolicy,
    backing: Option<Backing>,
}

impl Annotator {
    /// Create an annotator. Fails with a configuration error for unusable settings.
    pub fn new(config: AnnotatorConfig) -> Result<Self> {
        config.validate()?;

        let store = TableStore::with_config(config.columns.clone(), config.parser.clone())
            .with_labels(config.labels.clone());
        let session = AnnotationSession::new(config.labels.clone());
        let policy = PersistencePolicy::new(config.autosave_every);

        Ok(Self {
            config,
            store,
            session,
            policy,
            backing: None,
        })
    }

    /// Load a file and write it straight back so added columns reach disk.
    ///
    /// On failure nothing changes: a previously loaded table stays active.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&SourceMetadata> {
        let path = path.as_ref();
        let (table, source) = self.store.load(path)?;

        self.session.load(table);
        self.policy = PersistencePolicy::new(self.config.autosave_every);
        self.backing = Some(Backing {
            path: path.to_path_buf(),
            disk_hash: source.hash.clone(),
            source,
            written: None,
        });

        self.flush_in_place(SaveReason::LoadNormalization, true)?;

        self.source().ok_or_else(no_file)
    }

    /// Write a copy of the table to `path`. In-place saves keep their target.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<SourceMetadata> {
        let table = self.session.table().ok_or_else(no_file)?;
        self.store.save(table, path)
    }

    /// Save to the loaded file, unless another program changed it since.
    pub fn save_in_place(&mut self) -> Result<()> {
        self.flush_in_place(SaveReason::Manual, true).map(|_| ())
    }

    /// User-triggered save; same as [`save_in_place`](Self::save_in_place).
    pub fn manual_save(&mut self) -> Result<()> {
        self.save_in_place()
    }

    /// Save to the loaded file even if it was changed on disk.
    pub fn overwrite_in_place(&mut self) -> Result<()> {
        self.flush_in_place(SaveReason::Manual, false).map(|_| ())
    }

    /// The current row and its managed fields.
    pub fn display_row(&self) -> Result<DisplayRow<'_>> {
        let row = self.session.current_row()?;
        let table = self.session.table().ok_or_else(no_file)?;
        let position = row.position();

        Ok(DisplayRow {
            position,
            row_number: position + 1,
            row_count: table.row_count(),
            text: row.primary_text(),
            row,
            is_skipped: self.session.is_skipped(position),
            annotation: table.annotation(position),
            note: table.note(position),
        })
    }

    /// Label the current row and move to the next one.
    pub fn choose_label(&mut self, label: &str) -> Result<MutationEvent> {
        let event = self.session.annotate(label)?;
        self.after_mutation(&event)?;
        Ok(event)
    }

    /// Skip the current row and move to the next one.
    pub fn skip(&mut self) -> Result<MutationEvent> {
        let event = self.session.skip()?;
        self.after_mutation(&event)?;
        Ok(event)
    }

    /// Set or clear the current row's note.
    pub fn set_note(&mut self, text: &str) -> Result<MutationEvent> {
        let event = self.session.set_note(text)?;
        self.after_mutation(&event)?;
        Ok(event)
    }

    pub fn next_row(&mut self) -> Result<usize> {
        self.session.next_row()
    }

    pub fn previous_row(&mut self) -> Result<usize> {
        self.session.previous_row()
    }

    /// Jump to a 1-based row number.
    pub fn jump_to(&mut self, row: usize) -> Result<usize> {
        self.session.jump_to(row)
    }

    pub fn jump_to_skipped(&mut self, position: usize) -> Result<()> {
        self.session.jump_to_skipped(position)
    }

    pub fn next_skipped_after_cursor(&self) -> Result<usize> {
        self.session.next_skipped_after_cursor()
    }

    pub fn stats(&self) -> SessionStats {
        self.session.stats()
    }

    pub fn session(&self) -> &AnnotationSession {
        &self.session
    }

    pub fn policy(&self) -> &PersistencePolicy {
        &self.policy
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Path in-place saves write to.
    pub fn path(&self) -> Option<&Path> {
        self.backing.as_ref().map(|b| b.path.as_path())
    }

    /// Metadata of the backing file as it was read at load.
    pub fn source(&self) -> Option<&SourceMetadata> {
        self.backing.as_ref().map(|b| &b.source)
    }

    /// Metadata of the backing file as last written in place (always UTF-8).
    pub fn last_written(&self) -> Option<&SourceMetadata> {
        self.backing.as_ref().and_then(|b| b.written.as_ref())
    }

    fn after_mutation(&mut self, event: &MutationEvent) -> Result<()> {
        if let Some(reason) = self.policy.observe(event) {
            self.flush_in_place(reason, true)?;
        }
        Ok(())
    }

    fn flush_in_place(&mut self, reason: SaveReason, guarded: bool) -> Result<bool> {
        let backing = self.backing.as_mut().ok_or_else(no_file)?;
        let table = self.session.table().ok_or_else(no_file)?;
        let store = &self.store;

        self.policy.flush(reason, || {
            if guarded {
                let current = file_hash(&backing.path)
                    .map_err(|e| TriageError::save(&backing.path, e))?;
                if current.is_some_and(|hash| hash != backing.disk_hash) {
                    return Err(TriageError::ExternallyModified {
                        path: backing.path.clone(),
                    });
                }
            }

            let saved = store.save(table, &backing.path)?;
            backing.disk_hash = saved.hash.clone();
            backing.written = Some(saved);
            Ok(())
        })
    }
}

fn no_file() -> TriageError {
    TriageError::NoData("no file loaded".to_string())
}
