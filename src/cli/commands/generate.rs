//! `vdt generate` command - generate one datasheet

use console::style;
use std::path::{Path, PathBuf};

use crate::cli::commands::{emit_json, load_engine};
use crate::cli::CliError;
use crate::model::{Datasheet, ValidationStatus};

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// VDS number (e.g. BSFB1NR)
    pub vds_no: String,

    /// Emit the flat field-to-value view
    #[arg(long, conflicts_with = "structured")]
    pub flat: bool,

    /// Emit the structured view with traceability (default)
    #[arg(long)]
    pub structured: bool,

    /// Write the JSON to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: GenerateArgs, dir: Option<&Path>) -> Result<(), CliError> {
    let engine = load_engine(dir)?;
    let datasheet = engine.generate(&args.vds_no)?;

    let json = if args.flat {
        serde_json::to_string_pretty(&datasheet.flat_view())
    } else {
        serde_json::to_string_pretty(&datasheet)
    }
    .map_err(|e| CliError::Io(format!("failed to serialize datasheet: {e}")))?;

    emit_json(&json, args.out.as_deref())?;
    print_summary(&datasheet);
    Ok(())
}

/// One-line completion summary plus any findings, on stderr so the JSON
/// on stdout stays clean
fn print_summary(datasheet: &Datasheet) {
    let meta = &datasheet.metadata;
    let symbol = match meta.validation_status {
        ValidationStatus::Valid => style("✓").green(),
        ValidationStatus::Warnings => style("!").yellow(),
        ValidationStatus::Invalid => style("✗").red(),
    };

    eprintln!(
        "{} {}: {}/{} fields populated ({:.1}%), {}",
        symbol,
        style(&meta.vds_no).bold(),
        meta.completion.populated,
        meta.completion.total,
        meta.completion.percentage,
        meta.validation_status,
    );

    for error in &meta.validation_errors {
        eprintln!("  {} {}", style("✗").red(), error);
    }
    for warning in &meta.warnings {
        eprintln!("  {} {}", style("!").yellow(), warning);
    }
}
