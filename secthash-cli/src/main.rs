mod report;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use report::{OutputMode, Reporter};
use secthash_core::Binary;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Per-section SHA-1 fingerprints of an ELF binary
#[derive(Parser, Debug)]
#[command(
    name = "secthash",
    about = "Hash every section of an ELF object, executable or library",
    version,
    author
)]
struct Cli {
    /// Path to the ELF binary to examine
    path: Option<PathBuf>,

    /// CSV output
    #[arg(short = 'c', long = "csv", conflicts_with = "json")]
    csv: bool,

    /// JSON output, one object per section
    #[arg(short = 'j', long = "json")]
    json: bool,
}

impl Cli {
    fn mode(&self) -> OutputMode {
        if self.csv {
            OutputMode::Csv
        } else if self.json {
            OutputMode::Json
        } else {
            OutputMode::Plain
        }
    }
}

/// Writes the report for `cli.path` to `out`, or the usage text when no
/// path was given. Nothing reaches `out` unless every section was read.
fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let Some(path) = cli.path.as_deref() else {
        write!(out, "{}", Cli::command().render_help())?;
        return Ok(());
    };

    let mut bin = Binary::open(path)?;
    log::info!(
        "{}: {} ELF with {} sections",
        path.display(),
        bin.word_size(),
        bin.section_count()
    );

    let mut report = Reporter::new(Vec::new(), cli.mode(), path.display().to_string());
    report.header(bin.section_count())?;
    for rec in bin.sections() {
        report.section(&rec?)?;
    }
    let rendered = report.finish()?;

    out.write_all(&rendered)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err:#}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}
