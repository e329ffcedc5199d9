pub mod ask;
pub mod report;
pub mod shell;
pub mod status;
pub mod summary;

use std::io::Write;
use std::path::Path;

use clap::{Parser, Subcommand};

use crate::archive::load_archive;
use crate::error::Result;
use crate::models::Dataset;

#[derive(Parser)]
#[command(name = "nfe-analyst", about = "Ask questions about NF-e invoice archives.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the data summary that is sent along with every question.
    Summary {
        /// ZIP archive with the header and item CSV files
        archive: String,
    },
    /// Show the archive statistics as tables.
    Report {
        /// ZIP archive with the header and item CSV files
        archive: String,
    },
    /// Ask one question about an archive.
    Ask {
        /// ZIP archive with the header and item CSV files
        archive: String,
        /// Question in natural language
        question: String,
        /// Also parse the structured JSON block in the answer
        #[arg(long)]
        structured: bool,
    },
    /// Interactive session: load archives and ask several questions.
    Shell {
        /// Archive to load on start
        archive: Option<String>,
    },
    /// Show configuration and credential status.
    Status,
}

/// Progress observer that redraws a single stderr line.
pub(crate) fn progress_line(percent: u8) {
    let mut err = std::io::stderr();
    let _ = write!(err, "\rCarregando... {percent:>3}%");
    if percent >= 100 {
        let _ = writeln!(err);
    }
    let _ = err.flush();
}

/// Load with the stderr progress line. On failure the line is ended so the
/// error starts on its own line.
pub(crate) fn load_with_progress(archive: &str) -> Result<Dataset> {
    let mut progress = progress_line;
    let result = load_archive(Path::new(archive), &mut progress);
    if result.is_err() {
        eprintln!();
    }
    result
}
