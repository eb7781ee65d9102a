//! Label command - interactive labeling loop in the terminal.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use triage::{Annotator, AnnotatorConfig, LabelSet, MutationEvent, TriageError};

use super::{prompt_labels, resolve_config};

const RULE_WIDTH: usize = 60;

pub fn run(
    file: PathBuf,
    labels: Option<String>,
    config: Option<PathBuf>,
    delimiter: Option<u8>,
    autosave_every: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();

    let (config, label_source) = resolve_config(labels.as_deref(), config.as_deref())?;
    let mut config = match config {
        Some(config) => config,
        None => AnnotatorConfig::new(prompt_labels(&mut input, &mut out)?),
    };
    if delimiter.is_some() {
        config.parser.delimiter = delimiter;
    }
    if let Some(every) = autosave_every {
        config.autosave_every = every;
    }
    tracing::debug!(labels = %config.labels.joined(), source = ?label_source, "resolved labels");

    let mut annotator = Annotator::new(config)?;
    let source = annotator.load_file(&file)?;
    writeln!(
        out,
        "{} {} ({} rows, {}, {})",
        "Labeling".cyan().bold(),
        source.file.white(),
        source.row_count,
        source.format,
        source.encoding
    )?;
    if let Some(failure) = annotator.policy().last_failure() {
        writeln!(out, "{} {}", "Warning:".yellow(), failure)?;
    }
    writeln!(out, "Type {} for help.", "?".cyan())?;

    run_loop(&mut annotator, &mut input, &mut out)?;
    Ok(())
}

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Label(String),
    Skip,
    Next,
    Previous,
    /// 1-based row number.
    Jump(usize),
    NextSkipped,
    /// 1-based row number of a skipped row.
    JumpSkipped(usize),
    Note(Option<String>),
    Save,
    Overwrite,
    SaveAs(PathBuf),
    Help,
    Quit { force: bool },
    Refresh,
}

impl Command {
    /// Parse a line. An exact label token wins over commands and indexes.
    fn parse(line: &str, labels: &LabelSet) -> Result<Self, String> {
        let line = line.trim();
        if labels.contains(line) {
            return Ok(Command::Label(line.to_string()));
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match (word, rest) {
            ("", _) => Command::Refresh,
            ("s", "") => Command::Skip,
            ("n", "") => Command::Next,
            ("p", "") => Command::Previous,
            ("k", "") => Command::NextSkipped,
            ("w", "") => Command::Save,
            ("w!", "") => Command::Overwrite,
            ("q", "") => Command::Quit { force: false },
            ("q!", "") => Command::Quit { force: true },
            ("?", "") => Command::Help,
            ("g", n) => Command::Jump(parse_row(n)?),
            ("j", n) => Command::JumpSkipped(parse_row(n)?),
            ("note", "") => Command::Note(None),
            ("note", text) => Command::Note(Some(text.to_string())),
            ("saveas", "") => return Err("saveas needs a path".to_string()),
            ("saveas", path) => Command::SaveAs(PathBuf::from(path)),
            (index, "") if index.chars().all(|c| c.is_ascii_digit()) => {
                let label = index
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| i.checked_sub(1))
                    .and_then(|i| labels.get(i))
                    .ok_or_else(|| format!("no label number {} (1-{})", index, labels.len()))?;
                Command::Label(label.to_string())
            }
            _ => return Err(format!("unknown command '{}' (? for help)", line)),
        };
        Ok(command)
    }
}

fn parse_row(s: &str) -> Result<usize, String> {
    s.parse::<usize>()
        .map_err(|_| format!("expected a row number, got '{}'", s))
}

enum Flow {
    Render,
    Stay,
    Quit,
}

/// Read commands from `input` until quit or end of input.
///
/// End of input saves pending changes before returning.
fn run_loop<R: BufRead, W: Write>(
    annotator: &mut Annotator,
    input: &mut R,
    out: &mut W,
) -> io::Result<()> {
    let mut line = String::new();
    render(annotator, out)?;

    loop {
        write!(out, "{} ", ">".cyan())?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            if annotator.policy().has_unsaved_changes() {
                let result = annotator.save_in_place();
                report_save(annotator, result, out)?;
            }
            return Ok(());
        }

        let command = match Command::parse(&line, &annotator.config().labels) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "{} {}", "?".yellow(), message)?;
                continue;
            }
        };

        match execute(annotator, command, out)? {
            Flow::Render => render(annotator, out)?,
            Flow::Stay => {}
            Flow::Quit => return Ok(()),
        }
    }
}

fn execute<W: Write>(annotator: &mut Annotator, command: Command, out: &mut W) -> io::Result<Flow> {
    let moved = match command {
        Command::Label(label) => {
            let saves = annotator.policy().save_count();
            match annotator.choose_label(&label) {
                Ok(event) => Ok(report_autosave(annotator, &event, saves, out)),
                Err(e) => Err(e),
            }
        }
        Command::Skip => annotator.skip().map(|_| Ok(())),
        Command::Note(text) => annotator
            .set_note(text.as_deref().unwrap_or(""))
            .map(|_| Ok(())),
        Command::Next => annotator.next_row().map(|_| Ok(())),
        Command::Previous => annotator.previous_row().map(|_| Ok(())),
        Command::Jump(row) => annotator.jump_to(row).map(|_| Ok(())),
        Command::NextSkipped => annotator
            .next_skipped_after_cursor()
            .and_then(|position| annotator.jump_to_skipped(position))
            .map(Ok),
        Command::JumpSkipped(row) => match row.checked_sub(1) {
            Some(position) => annotator.jump_to_skipped(position).map(Ok),
            None => Err(TriageError::OutOfRange {
                row,
                row_count: annotator.session().row_count(),
            }),
        },
        Command::Save => {
            let result = annotator.save_in_place();
            report_save(annotator, result, out)?;
            return Ok(Flow::Stay);
        }
        Command::Overwrite => {
            let result = annotator.overwrite_in_place();
            report_save(annotator, result, out)?;
            return Ok(Flow::Stay);
        }
        Command::SaveAs(path) => {
            match annotator.save_as(&path) {
                Ok(saved) => writeln!(
                    out,
                    "{} copy to {} ({} rows)",
                    "Saved".green(),
                    saved.path.display(),
                    saved.row_count
                )?,
                Err(e) => print_error(&e, out)?,
            }
            return Ok(Flow::Stay);
        }
        Command::Help => {
            print_help(&annotator.config().labels, out)?;
            return Ok(Flow::Stay);
        }
        Command::Quit { force: false } if annotator.policy().has_unsaved_changes() => {
            writeln!(
                out,
                "{} unsaved changes. Use {} to save or {} to quit without saving.",
                "Warning:".yellow(),
                "w".cyan(),
                "q!".cyan()
            )?;
            return Ok(Flow::Stay);
        }
        Command::Quit { .. } => return Ok(Flow::Quit),
        Command::Refresh => return Ok(Flow::Render),
    };

    match moved {
        Ok(written) => {
            written?;
            Ok(Flow::Render)
        }
        Err(e) => {
            print_error(&e, out)?;
            Ok(Flow::Stay)
        }
    }
}

/// Tell the user whether a label triggered an auto-save, and whether it worked.
fn report_autosave<W: Write>(
    annotator: &Annotator,
    event: &MutationEvent,
    saves_before: usize,
    out: &mut W,
) -> io::Result<()> {
    let MutationEvent::Annotated {
        annotated_count, ..
    } = event
    else {
        return Ok(());
    };
    let policy = annotator.policy();
    if annotated_count % policy.autosave_every() != 0 {
        return Ok(());
    }

    if policy.save_count() > saves_before {
        writeln!(out, "{} ({} labeled)", "Auto-saved".green(), annotated_count)
    } else {
        writeln!(
            out,
            "{} {}",
            "Auto-save failed:".red(),
            policy.last_failure().unwrap_or("unknown error")
        )
    }
}

fn report_save<W: Write>(
    annotator: &Annotator,
    result: triage::Result<()>,
    out: &mut W,
) -> io::Result<()> {
    match result {
        Ok(()) => writeln!(
            out,
            "{} {}",
            "Saved".green(),
            annotator.path().map(Path::display).map(|d| d.to_string()).unwrap_or_default()
        ),
        Err(e @ TriageError::ExternallyModified { .. }) => {
            print_error(&e, out)?;
            writeln!(
                out,
                "Use {} to overwrite it or {} to write a copy.",
                "w!".cyan(),
                "saveas <PATH>".cyan()
            )
        }
        Err(e) => print_error(&e, out),
    }
}

fn print_error<W: Write>(e: &TriageError, out: &mut W) -> io::Result<()> {
    tracing::debug!(kind = e.kind(), error = %e, "command failed");
    writeln!(out, "{} {}", "Error:".red(), e)
}

fn render<W: Write>(annotator: &Annotator, out: &mut W) -> io::Result<()> {
    let row = match annotator.display_row() {
        Ok(row) => row,
        Err(e) => return writeln!(out, "{}", e.to_string().yellow()),
    };
    let stats = annotator.stats();
    let columns = &annotator.config().columns;
    let rule = "-".repeat(RULE_WIDTH);

    writeln!(out)?;
    writeln!(
        out,
        "{}  {}",
        format!("Row {} / {}", row.row_number, row.row_count).cyan().bold(),
        format!(
            "{} labeled, {} skipped, {:.0}% done",
            stats.annotated,
            stats.skipped,
            stats.progress() * 100.0
        )
        .dimmed()
    )?;
    if row.is_skipped {
        writeln!(out, "{}", "[skipped]".yellow())?;
    }

    writeln!(out, "{}", rule.dimmed())?;
    writeln!(out, "{}", row.text.unwrap_or_default())?;
    writeln!(out, "{}", rule.dimmed())?;

    let primary = annotator.session().table().and_then(|t| t.primary_field());
    for (index, (name, value)) in row.row.iter().enumerate() {
        if Some(index) == primary
            || name == columns.annotation
            || name == columns.note
            || name == columns.skip
        {
            continue;
        }
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            writeln!(out, "  {}: {}", name.dimmed(), value)?;
        }
    }

    match row.annotation {
        Some(label) => writeln!(out, "Label: {}", label.green().bold())?,
        None => writeln!(out, "Label: {}", "-".dimmed())?,
    }
    if let Some(note) = row.note {
        writeln!(out, "Note:  {}", note)?;
    }

    let menu: Vec<String> = annotator
        .config()
        .labels
        .iter()
        .enumerate()
        .map(|(i, label)| format!("[{}] {}", i + 1, label))
        .collect();
    writeln!(out, "{}", menu.join("  "))
}

fn print_help<W: Write>(labels: &LabelSet, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "Commands:".yellow().bold())?;
    writeln!(out, "  <label> or 1-{}  label the row and move on", labels.len())?;
    writeln!(out, "  s                skip the row for later")?;
    writeln!(out, "  n / p            next / previous row")?;
    writeln!(out, "  g <N>            go to row N")?;
    writeln!(out, "  k                go to the next skipped row")?;
    writeln!(out, "  j <N>            go to skipped row N")?;
    writeln!(out, "  note [text]      set or clear the row's note")?;
    writeln!(out, "  w / w!           save / save even if the file changed on disk")?;
    writeln!(out, "  saveas <PATH>    write a copy")?;
    writeln!(out, "  q / q!           quit / quit without saving")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;
    use triage::TableStore;

    fn labels() -> LabelSet {
        LabelSet::parse("spam, ham").unwrap()
    }

    #[test]
    fn test_parse_commands() {
        let labels = labels();
        assert_eq!(Command::parse("s", &labels), Ok(Command::Skip));
        assert_eq!(Command::parse("  g 12 ", &labels), Ok(Command::Jump(12)));
        assert_eq!(Command::parse("j 3", &labels), Ok(Command::JumpSkipped(3)));
        assert_eq!(Command::parse("w!", &labels), Ok(Command::Overwrite));
        assert_eq!(Command::parse("", &labels), Ok(Command::Refresh));
        assert_eq!(
            Command::parse("note call back", &labels),
            Ok(Command::Note(Some("call back".to_string())))
        );
        assert_eq!(Command::parse("note", &labels), Ok(Command::Note(None)));
        assert!(Command::parse("g x", &labels).is_err());
        assert!(Command::parse("saveas", &labels).is_err());
        assert!(Command::parse("bogus", &labels).is_err());
    }

    #[test]
    fn test_parse_labels_and_indexes() {
        let labels = labels();
        assert_eq!(
            Command::parse("ham", &labels),
            Ok(Command::Label("ham".to_string()))
        );
        assert_eq!(
            Command::parse("1", &labels),
            Ok(Command::Label("spam".to_string()))
        );
        assert!(Command::parse("0", &labels).is_err());
        assert!(Command::parse("3", &labels).is_err());
    }

    #[test]
    fn test_numeric_labels_match_before_indexes() {
        let labels = LabelSet::parse("0,1").unwrap();
        assert_eq!(
            Command::parse("1", &labels),
            Ok(Command::Label("1".to_string()))
        );
        assert_eq!(
            Command::parse("2", &labels),
            Ok(Command::Label("1".to_string()))
        );
    }

    fn run_script(content: &str, script: &str) -> (tempfile::TempDir, PathBuf, String) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inbox.csv");
        fs::write(&path, content).unwrap();

        let mut annotator = Annotator::new(AnnotatorConfig::new(labels())).unwrap();
        annotator.load_file(&path).unwrap();

        let mut out = Vec::new();
        run_loop(&mut annotator, &mut Cursor::new(script), &mut out).unwrap();
        (dir, path, String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn test_scripted_session() {
        let (_dir, path, _) = run_script("body\na\nb\nc\n", "1\ns\nnote later\nw\nq\n");

        let (table, _) = TableStore::new().load(&path).unwrap();
        assert_eq!(table.annotation(0), Some("spam"));
        assert!(table.is_skipped(1));
        assert_eq!(table.note(2), Some("later"));
    }

    #[test]
    fn test_quit_warns_about_unsaved_changes() {
        let (_dir, path, output) = run_script("body\na\nb\n", "ham\nq\nq!\n");

        assert!(output.contains("unsaved changes"));
        let (table, _) = TableStore::new().load(&path).unwrap();
        assert_eq!(table.annotation(0), None);
    }

    #[test]
    fn test_end_of_input_saves() {
        let (_dir, path, _) = run_script("body\na\nb\n", "2\n");

        let (table, _) = TableStore::new().load(&path).unwrap();
        assert_eq!(table.annotation(0), Some("ham"));
    }

    #[test]
    fn test_errors_keep_the_loop_running() {
        let (_dir, path, output) = run_script("body\na\nb\n", "g 9\nk\nj 1\nbogus\n1\nw\nq\n");

        assert!(output.contains("out of range"));
        assert!(output.contains("No skipped rows"));
        let (table, _) = TableStore::new().load(&path).unwrap();
        assert_eq!(table.annotation(0), Some("spam"));
    }
}
