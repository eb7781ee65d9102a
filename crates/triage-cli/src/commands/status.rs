//! Status command - show labeling progress without touching the file.

use std::path::{Path, PathBuf};

use colored::Colorize;
use triage::{
    AnnotationSession, DEFAULT_LABELS_PROMPT, LabelSet, SourceMetadata, Table, TableStore,
};

use super::resolve_config;

/// Number of skipped row numbers listed before eliding the rest.
const MAX_LISTED_SKIPS: usize = 20;

pub fn run(
    file: PathBuf,
    labels: Option<String>,
    config: Option<PathBuf>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (config, _) = resolve_config(labels.as_deref(), config.as_deref())?;

    let store = match &config {
        Some(config) => {
            TableStore::with_config(config.columns.clone(), config.parser.clone())
                .with_labels(config.labels.clone())
        }
        None => TableStore::new(),
    };
    let (table, source) = store.load(&file)?;

    let labels = match config {
        Some(config) => config.labels,
        None => observed_labels(&table)?,
    };
    let mut session = AnnotationSession::new(labels);
    session.load(table);

    if json_output {
        print_json(&session, &source)?;
    } else {
        print_report(&session, &source, &file);
    }

    Ok(())
}

/// Labels already present in the file, or the default vocabulary if there are none.
fn observed_labels(table: &Table) -> triage::Result<LabelSet> {
    let found: Vec<&str> = (0..table.row_count())
        .filter_map(|p| table.annotation(p))
        .collect();

    if found.is_empty() {
        LabelSet::parse(DEFAULT_LABELS_PROMPT)
    } else {
        LabelSet::new(found)
    }
}

fn skipped_rows(session: &AnnotationSession) -> Vec<usize> {
    session.skipped_positions().map(|p| p + 1).collect()
}

fn print_json(
    session: &AnnotationSession,
    source: &SourceMetadata,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = session.stats();
    let status = serde_json::json!({
        "file": source.file,
        "format": source.format,
        "encoding": source.encoding,
        "hash": source.hash,
        "rows": stats.total,
        "annotated": stats.annotated,
        "skipped": stats.skipped,
        "remaining": stats.remaining(),
        "progress": stats.progress(),
        "is_complete": stats.is_complete(),
        "labels": session.label_distribution(),
        "skipped_rows": skipped_rows(session),
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn print_report(session: &AnnotationSession, source: &SourceMetadata, file: &Path) {
    let stats = session.stats();

    println!(
        "{} {}",
        "Labeling status for".cyan().bold(),
        source.file.white()
    );
    println!(
        "  {} rows, {}, {}",
        stats.total, source.format, source.encoding
    );
    println!();

    // Progress bar
    let progress = stats.progress();
    let bar_width = 30;
    let filled = (progress * bar_width as f64).round() as usize;
    let bar: String = "█".repeat(filled) + &"░".repeat(bar_width - filled);

    println!(
        "Progress: {} {}/{} ({:.0}%)",
        bar.cyan(),
        stats.annotated.to_string().white().bold(),
        stats.total,
        progress * 100.0
    );
    println!();

    println!("{}", "Rows:".yellow().bold());
    println!("  Labeled:   {}", stats.annotated.to_string().green());
    println!("  Remaining: {}", stats.remaining().to_string().white());
    println!("  Skipped:   {}", stats.skipped.to_string().yellow());
    println!();

    println!("{}", "Labels:".yellow().bold());
    for (label, count) in session.label_distribution() {
        let line = format!("  {:<24} {}", label, count);
        if session.labels().contains(&label) {
            println!("{}", line);
        } else {
            println!("{} {}", line.red(), "(not in vocabulary)".dimmed());
        }
    }
    println!();

    let skipped = skipped_rows(session);
    if !skipped.is_empty() {
        let listed: Vec<String> = skipped
            .iter()
            .take(MAX_LISTED_SKIPS)
            .map(|r| r.to_string())
            .collect();
        let more = skipped.len().saturating_sub(MAX_LISTED_SKIPS);
        if more > 0 {
            println!("Skipped rows: {} (+{} more)", listed.join(", "), more);
        } else {
            println!("Skipped rows: {}", listed.join(", "));
        }
        println!();
    }

    if stats.is_complete() {
        println!("{}", "All rows are labeled!".green().bold());
    } else {
        println!(
            "Run {} to continue labeling.",
            format!("triage label {}", file.display()).cyan().bold()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_observed_labels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inbox.csv");
        fs::write(&path, "body,annotation\na,ham\nb,spam\nc,ham\nd,\n").unwrap();

        let (table, _) = TableStore::new().load(&path).unwrap();
        let labels = observed_labels(&table).unwrap();
        assert_eq!(labels.joined(), "ham, spam");
    }

    #[test]
    fn test_observed_labels_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inbox.csv");
        fs::write(&path, "body\na\n").unwrap();

        let (table, _) = TableStore::new().load(&path).unwrap();
        assert_eq!(observed_labels(&table).unwrap().len(), 3);
    }

    #[test]
    fn test_status_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inbox.csv");
        fs::write(&path, "body\na\nb\n").unwrap();

        run(path.clone(), Some("spam,ham".to_string()), None, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "body\na\nb\n");
    }
}
