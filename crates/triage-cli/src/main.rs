//! Triage CLI - resumable row labeling in the terminal.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose) {
        eprintln!("Warning: could not initialize logging: {}", e);
    }

    let result = match cli.command {
        Commands::Label {
            file,
            labels,
            config,
            delimiter,
            autosave_every,
        } => commands::label::run(file, labels, config, delimiter, autosave_every),

        Commands::Status {
            file,
            labels,
            config,
            json,
        } => commands::status::run(file, labels, config, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
