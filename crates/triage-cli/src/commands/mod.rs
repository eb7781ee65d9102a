//! CLI command implementations.

pub mod label;
pub mod status;

use std::io::{self, BufRead, Write};
use std::path::Path;

use triage::{AnnotatorConfig, DEFAULT_LABELS_PROMPT, LabelSet, TriageError};

/// Where the label vocabulary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    /// `--labels` or `TRIAGE_LABELS`
    Argument,
    /// `--config`
    ConfigFile,
    /// Nothing was given.
    Missing,
}

/// Build a configuration from `--config` and `--labels`.
///
/// Labels given on the command line (or via `TRIAGE_LABELS`) replace those in the
/// config file. Without either, the configuration is `None`.
pub fn resolve_config(
    labels: Option<&str>,
    config: Option<&Path>,
) -> Result<(Option<AnnotatorConfig>, LabelSource), TriageError> {
    let from_file = config.map(AnnotatorConfig::from_json_file).transpose()?;
    let from_args = labels.map(LabelSet::parse).transpose()?;

    Ok(match (from_file, from_args) {
        (Some(config), Some(labels)) => (
            Some(AnnotatorConfig {
                labels,
                ..config
            }),
            LabelSource::Argument,
        ),
        (None, Some(labels)) => (Some(AnnotatorConfig::new(labels)), LabelSource::Argument),
        (Some(config), None) => (Some(config), LabelSource::ConfigFile),
        (None, None) => (None, LabelSource::Missing),
    })
}

/// Ask for a label vocabulary on the terminal.
///
/// A blank answer accepts the suggested default; end of input cancels.
pub fn prompt_labels<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<LabelSet, TriageError> {
    let prompt_error = |e: io::Error| TriageError::Config(format!("could not read labels: {}", e));

    write!(
        out,
        "Enter annotation labels, comma-separated [{}]: ",
        DEFAULT_LABELS_PROMPT
    )
    .and_then(|_| out.flush())
    .map_err(prompt_error)?;

    let mut line = String::new();
    if input.read_line(&mut line).map_err(prompt_error)? == 0 {
        return Err(TriageError::Config(
            "no annotation labels given".to_string(),
        ));
    }

    let answer = line.trim();
    if answer.is_empty() {
        LabelSet::parse(DEFAULT_LABELS_PROMPT)
    } else {
        LabelSet::parse(answer)
    }
}
