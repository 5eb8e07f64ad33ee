//! CLI command implementations

pub mod batch;
pub mod generate;
pub mod serve;
pub mod validate;

use std::path::Path;

use crate::cli::CliError;
use crate::engine::Engine;

/// Load the engine from the config-and-data directory, or entirely from
/// the embedded defaults when no directory is given
pub fn load_engine(dir: Option<&Path>) -> Result<Engine, CliError> {
    let engine = match dir {
        Some(dir) => Engine::from_dir(dir)?,
        None => Engine::with_defaults()?,
    };
    Ok(engine)
}

/// Write JSON to a file, or to stdout when no path is given
pub fn emit_json(json: &str, out: Option<&Path>) -> Result<(), CliError> {
    match out {
        Some(path) => std::fs::write(path, json)
            .map_err(|e| CliError::Io(format!("failed to write {}: {e}", path.display()))),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
