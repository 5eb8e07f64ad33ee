//! Repo module - read-only in-memory indexes over extracted source data

pub mod pms;
pub mod standards;
pub mod vds_index;

pub use pms::PmsRepository;
pub use standards::StandardsRepository;
pub use vds_index::{VdsIndexRepository, VdsIndexRow};

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Failures loading an extracted data file
#[derive(Debug, Error, Diagnostic)]
pub enum RepoError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {file}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("embedded default {name} is missing")]
    MissingEmbedded { name: String },
}
