//! `vdt validate` command - check a VDS number against the grammar

use console::style;
use std::path::Path;

use crate::cli::commands::load_engine;
use crate::cli::CliError;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// VDS number to check
    pub vds_no: String,
}

pub fn run(args: ValidateArgs, dir: Option<&Path>) -> Result<(), CliError> {
    let engine = load_engine(dir)?;
    match engine.decode(&args.vds_no) {
        Ok(decoded) => {
            println!(
                "{} {} is valid: {}, class {}, {} ends",
                style("✓").green(),
                style(&decoded.raw).bold(),
                decoded.valve_type(),
                decoded.piping_class,
                decoded.end_connection_name,
            );
            Ok(())
        }
        Err(err) => Err(CliError::InvalidVds(err)),
    }
}
