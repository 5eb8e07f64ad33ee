//! `vdt batch` command - generate datasheets for a file of VDS numbers

use console::style;
use std::path::{Path, PathBuf};

use crate::cli::commands::{emit_json, load_engine};
use crate::cli::CliError;
use crate::engine::{BatchReport, BatchStatus};

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    /// File with one VDS number per line; blank lines are skipped
    pub file: PathBuf,

    /// Write the JSON report to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: BatchArgs, dir: Option<&Path>) -> Result<(), CliError> {
    let content = std::fs::read_to_string(&args.file)
        .map_err(|e| CliError::Io(format!("failed to read {}: {e}", args.file.display())))?;

    let codes: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let engine = load_engine(dir)?;
    let results = engine.generate_batch(&codes, None)?;
    let report = BatchReport::from_items(results);

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::Io(format!("failed to serialize batch report: {e}")))?;
    emit_json(&json, args.out.as_deref())?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &BatchReport) {
    for item in &report.results {
        match item.status {
            BatchStatus::Success => {
                eprintln!("{} {}", style("✓").green(), item.vds_no);
            }
            BatchStatus::Error => {
                eprintln!(
                    "{} {} - {}",
                    style("✗").red(),
                    item.vds_no,
                    item.error.as_deref().unwrap_or("unknown error"),
                );
            }
        }
    }

    eprintln!();
    eprintln!("{}", style("─".repeat(40)).dim());
    eprintln!(
        "  Total:     {}",
        style(report.total).cyan()
    );
    eprintln!(
        "  Succeeded: {}",
        style(report.succeeded).green()
    );
    eprintln!(
        "  Failed:    {}",
        style(report.failed).red()
    );
}
