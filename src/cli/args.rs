//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::batch::BatchArgs;
use crate::cli::commands::generate::GenerateArgs;
use crate::cli::commands::serve::ServeArgs;
use crate::cli::commands::validate::ValidateArgs;

/// Generate fully traceable valve datasheets from VDS numbers
#[derive(Parser, Debug)]
#[command(name = "vdt", version, about)]
pub struct Cli {
    /// Directory holding the config rulebooks and extracted data files;
    /// embedded defaults fill in for any missing file
    #[arg(long, global = true, env = "VDT_DIR")]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a datasheet for one VDS number
    Generate(GenerateArgs),

    /// Generate datasheets for a file of VDS numbers, one per line
    Batch(BatchArgs),

    /// Check a VDS number against the grammar
    Validate(ValidateArgs),

    /// Serve the HTTP API
    Serve(ServeArgs),
}
