//! Configuration: label vocabulary, managed column names, save cadence.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::input::ParserConfig;

/// Labels offered when the user is asked for a vocabulary.
pub const DEFAULT_LABELS_PROMPT: &str = "Deceptive, Targeted, Extortion/Blackmail";

/// Default number of annotated rows between automatic saves.
pub const DEFAULT_AUTOSAVE_EVERY: usize = 10;

/// Ordered, non-empty set of valid label tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Build a vocabulary from individual labels.
    ///
    /// Labels are trimmed; blanks and repeats are dropped (first occurrence wins).
    /// An empty result is a configuration error.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() || unique.iter().any(|l| l == label) {
                continue;
            }
            unique.push(label.to_string());
        }

        if unique.is_empty() {
            return Err(TriageError::Config(
                "at least one annotation label is required".to_string(),
            ));
        }

        Ok(Self { labels: unique })
    }

    /// Parse a comma-separated list such as `"spam, ham"`.
    pub fn parse(input: &str) -> Result<Self> {
        Self::new(input.split(','))
    }

    /// Check whether `label` is part of the vocabulary.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Position of a label in the vocabulary.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Label at a 0-based position.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false; a `LabelSet` cannot be constructed empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|s| s.as_str())
    }

    /// Labels joined for display, e.g. `"spam, ham"`.
    pub fn joined(&self) -> String {
        self.labels.join(", ")
    }
}

impl TryFrom<Vec<String>> for LabelSet {
    type Error = TriageError;

    fn try_from(labels: Vec<String>) -> Result<Self> {
        Self::new(labels)
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(set: LabelSet) -> Self {
        set.labels
    }
}

/// Names of the three columns the tool manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Column holding the chosen label.
    pub annotation: String,
    /// Column holding free-form notes.
    pub note: String,
    /// Column holding the 0/1 skip flag.
    pub skip: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            annotation: "annotation".to_string(),
            note: "note".to_string(),
            skip: "skipped".to_string(),
        }
    }
}

impl ColumnNames {
    fn validate(&self) -> Result<()> {
        let names = [&self.annotation, &self.note, &self.skip];
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(TriageError::Config(
                "managed column names must not be empty".to_string(),
            ));
        }
        if self.annotation == self.note || self.annotation == self.skip || self.note == self.skip {
            return Err(TriageError::Config(format!(
                "managed column names must be distinct (got '{}', '{}', '{}')",
                self.annotation, self.note, self.skip
            )));
        }
        Ok(())
    }
}

/// Configuration for an annotation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    /// Valid label tokens, in display order.
    pub labels: LabelSet,
    /// Managed column names.
    #[serde(default)]
    pub columns: ColumnNames,
    /// Save automatically each time the annotated count reaches a multiple of this.
    #[serde(default = "default_autosave_every")]
    pub autosave_every: usize,
    /// Parser configuration.
    #[serde(skip)]
    pub parser: ParserConfig,
}

fn default_autosave_every() -> usize {
    DEFAULT_AUTOSAVE_EVERY
}

impl AnnotatorConfig {
    /// Create a configuration with default columns and cadence.
    pub fn new(labels: LabelSet) -> Self {
        Self {
            labels,
            columns: ColumnNames::default(),
            autosave_every: DEFAULT_AUTOSAVE_EVERY,
            parser: ParserConfig::default(),
        }
    }

    /// Read a configuration from a JSON file.
    ///
    /// ```json
    /// { "labels": ["spam", "ham"], "autosave_every": 5 }
    /// ```
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TriageError::Config(format!("Failed to open '{}': {}", path.display(), e))
        })?;

        let config: AnnotatorConfig =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                TriageError::Config(format!("Failed to parse '{}': {}", path.display(), e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Set the managed column names.
    pub fn with_columns(mut self, columns: ColumnNames) -> Self {
        self.columns = columns;
        self
    }

    /// Set the auto-save cadence.
    pub fn with_autosave_every(mut self, every: usize) -> Self {
        self.autosave_every = every;
        self
    }

    /// Set the parser configuration.
    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    /// Check the configuration for values that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.autosave_every == 0 {
            return Err(TriageError::Config(
                "autosave_every must be at least 1".to_string(),
            ));
        }
        self.columns.validate()
    }
}
