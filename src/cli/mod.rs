//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::{DecodeError, EngineError, LoadError};
use crate::repo::RepoError;
use crate::yaml::YamlError;

/// Command failures, carrying the process exit code.
///
/// 2 marks an invalid VDS, 3 a configuration problem, 4 an I/O failure.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidVds(#[from] DecodeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),

    #[error("{0}")]
    Io(String),

    #[error("deadline exceeded")]
    Timeout,
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::InvalidVds(_) => 2,
            CliError::Load(err) => load_exit_code(err),
            CliError::Io(_) => 4,
            CliError::Timeout => 1,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Input(e) => CliError::InvalidVds(e),
            EngineError::Timeout => CliError::Timeout,
        }
    }
}

fn load_exit_code(err: &LoadError) -> u8 {
    match err {
        LoadError::Config(ConfigError::Yaml(YamlError::Read { .. })) => 4,
        LoadError::Config(_) => 3,
        LoadError::Repo(RepoError::Io { .. }) => 4,
        LoadError::Repo(_) => 3,
    }
}
