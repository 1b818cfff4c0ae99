//! CLI entrypoint for the binfile scenario harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use binfile::config::{LogThreshold, set_log_threshold};
use binfile::log::{self, LogEmitter};
use binfile_harness::HarnessError;

/// Scenario tooling for binfile.
#[derive(Debug, Parser)]
#[command(name = "binfile-harness")]
#[command(about = "Scenario runner and log validator for binfile")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the gap round trip and the open-flag matrix in a directory.
    GapCheck {
        /// Scratch directory (created if missing).
        #[arg(long)]
        dir: PathBuf,
        /// Extra gap size in KiB, run after the standard 0/1/32 KiB gaps.
        #[arg(long)]
        gap_kib: Option<u64>,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Log threshold: off, warn or debug.
        #[arg(long, default_value = "debug")]
        log_level: String,
    },
    /// Validate a structured JSONL log file.
    ValidateLog {
        /// Structured JSONL log path.
        #[arg(long)]
        log: PathBuf,
    },
}

fn run_id() -> String {
    format!("run-{}", std::process::id())
}

#[cfg(unix)]
fn gap_check(
    dir: PathBuf,
    gap_kib: Option<u64>,
    log_path: Option<PathBuf>,
    log_level: &str,
) -> Result<(), HarnessError> {
    std::fs::create_dir_all(&dir)?;
    set_log_threshold(LogThreshold::from_str_loose(log_level));
    if let Some(path) = &log_path {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        log::install(LogEmitter::to_file(path, "binfile-harness", &run_id())?);
    }

    let summary = binfile_harness::run_all(&dir, gap_kib);
    log::uninstall();
    let summary = summary?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    eprintln!("{}", summary.times);
    if summary.passed {
        Ok(())
    } else {
        let failed = summary.gaps.iter().filter(|g| !g.passed).count()
            + summary.flag_matrix.iter().filter(|c| !c.passed).count();
        Err(HarnessError::Mismatch {
            scenario: "gap-check".to_string(),
            expected: "all cases pass".to_string(),
            actual: format!("{failed} failing case(s)"),
        })
    }
}

#[cfg(not(unix))]
fn gap_check(
    _dir: PathBuf,
    _gap_kib: Option<u64>,
    _log_path: Option<PathBuf>,
    _log_level: &str,
) -> Result<(), HarnessError> {
    Err(HarnessError::Io(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "gap-check needs a unix target",
    )))
}

fn validate_log(path: PathBuf) -> Result<(), HarnessError> {
    let (lines, errors) = binfile_harness::validate_log_file(&path)?;
    for err in &errors {
        eprintln!("{err}");
    }
    eprintln!(
        "{}: {lines} line(s), {} error(s)",
        path.display(),
        errors.len()
    );
    if errors.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::InvalidLog(errors.len()))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::GapCheck {
            dir,
            gap_kib,
            log,
            log_level,
        } => gap_check(dir, gap_kib, log, &log_level)?,
        Command::ValidateLog { log } => validate_log(log)?,
    }

    Ok(())
}
