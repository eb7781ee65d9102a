//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Triage: label the rows of a CSV/TSV file, one at a time
#[derive(Parser)]
#[command(name = "triage")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug) logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Label a data file interactively, resuming where the last run stopped
    Label {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Comma-separated label vocabulary (e.g. "spam, ham")
        #[arg(short, long, env = "TRIAGE_LABELS")]
        labels: Option<String>,

        /// JSON configuration file (labels, columns, autosave_every)
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Field delimiter: ',', ';', '|' or 'tab' (default: from extension or content)
        #[arg(short, long, value_parser = parse_delimiter)]
        delimiter: Option<u8>,

        /// Save automatically every N labeled rows
        #[arg(long, value_name = "N")]
        autosave_every: Option<usize>,
    },

    /// Show labeling progress for a data file without modifying it
    Status {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Comma-separated label vocabulary
        #[arg(short, long, env = "TRIAGE_LABELS")]
        labels: Option<String>,

        /// JSON configuration file (labels, columns)
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse a delimiter argument into a single byte.
fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        _ => Err(format!(
            "delimiter must be a single ASCII character or 'tab', got '{}'",
            s
        )),
    }
}
