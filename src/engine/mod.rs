//! Engine module - the pure generation pipeline
//!
//! Decoder, per-field resolver, material selection and assembler behind a
//! single facade. The engine is immutable after construction and safe to
//! share across request handlers.

pub mod assembler;
pub mod decoder;
pub mod materials;
pub mod resolver;

pub use decoder::{DecodeError, VdsDecoder};
pub use materials::{select_material, MaterialSelection};
pub use resolver::{FieldResolver, ResolveError};

use miette::Diagnostic;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

use crate::config::{embedded::read_default, Config, ConfigError};
use crate::model::{Datasheet, DecodedVds, FlatView};
use crate::repo::{PmsRepository, RepoError, StandardsRepository, VdsIndexRepository};
use assembler::Assembler;

/// Data file names the loader looks for in the config-and-data directory
pub const PIPING_SPEC_FILE: &str = "piping_spec.json";
pub const CLAUSES_FILE: &str = "clauses.json";
pub const VDS_INDEX_FILE: &str = "vds_index.json";

/// Failures that abort a request
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Input(#[from] DecodeError),

    #[error("deadline exceeded")]
    Timeout,
}

/// Failures building an engine at startup
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Repo(#[from] RepoError),
}

/// One result of a batch generation
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub vds_no: String,
    pub status: BatchStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<FlatView>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Error,
}

/// A whole batch with its summary counts
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchItem>,
}

impl BatchReport {
    pub fn from_items(results: Vec<BatchItem>) -> Self {
        let succeeded = results
            .iter()
            .filter(|r| r.status == BatchStatus::Success)
            .count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}

/// Valve-type entry of the metadata view
#[derive(Debug, Clone, Serialize)]
pub struct ValveTypeInfo {
    pub prefix: String,
    pub name: String,
    pub primary_standard: String,
}

/// Code/name entry of the metadata view
#[derive(Debug, Clone, Serialize)]
pub struct CodeName {
    pub code: String,
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Everything a form UI needs to offer valid choices
#[derive(Debug, Clone, Serialize)]
pub struct EngineMetadata {
    pub valve_types: Vec<ValveTypeInfo>,
    pub piping_classes: Vec<String>,
    pub end_connections: Vec<CodeName>,
    pub bore_types: Vec<CodeName>,
    pub pressure_classes: Vec<u32>,
}

/// The datasheet generation engine.
///
/// Owns the configuration and the three repositories; all operations are
/// pure functions over that immutable state.
pub struct Engine {
    config: Config,
    decoder: VdsDecoder,
    pms: PmsRepository,
    standards: StandardsRepository,
    vds_index: VdsIndexRepository,
}

impl Engine {
    pub fn new(
        config: Config,
        pms: PmsRepository,
        standards: StandardsRepository,
        vds_index: VdsIndexRepository,
    ) -> Self {
        let decoder = VdsDecoder::new(&config);
        Self {
            config,
            decoder,
            pms,
            standards,
            vds_index,
        }
    }

    /// Build from a config-and-data directory; any file the directory does
    /// not provide falls back to the embedded default
    pub fn from_dir(dir: &Path) -> Result<Self, LoadError> {
        let config = Config::load(dir)?;
        let pms = load_repo(dir, PIPING_SPEC_FILE, PmsRepository::from_path, |c, f| {
            PmsRepository::from_json_str(c, f)
        })?;
        let standards = load_repo(dir, CLAUSES_FILE, StandardsRepository::from_path, |c, f| {
            StandardsRepository::from_json_str(c, f)
        })?;
        let vds_index = load_repo(dir, VDS_INDEX_FILE, VdsIndexRepository::from_path, |c, f| {
            VdsIndexRepository::from_json_str(c, f)
        })?;
        Ok(Self::new(config, pms, standards, vds_index))
    }

    /// Build entirely from the embedded defaults
    pub fn with_defaults() -> Result<Self, LoadError> {
        let config = Config::embedded()?;
        let pms = embedded_repo(PIPING_SPEC_FILE, |c, f| PmsRepository::from_json_str(c, f))?;
        let standards = embedded_repo(CLAUSES_FILE, |c, f| StandardsRepository::from_json_str(c, f))?;
        let vds_index = embedded_repo(VDS_INDEX_FILE, |c, f| VdsIndexRepository::from_json_str(c, f))?;
        Ok(Self::new(config, pms, standards, vds_index))
    }

    /// Decode a VDS number without generating a datasheet
    pub fn decode(&self, vds_no: &str) -> Result<DecodedVds, DecodeError> {
        self.decoder.decode(vds_no, &self.pms)
    }

    /// Validate a VDS number; Ok means it decodes
    pub fn validate_vds(&self, vds_no: &str) -> Result<(), DecodeError> {
        self.decoder.validate(vds_no, &self.pms)
    }

    /// Generate a complete datasheet
    pub fn generate(&self, vds_no: &str) -> Result<Datasheet, EngineError> {
        self.generate_with_deadline(vds_no, None)
    }

    /// Generate with a request deadline, checked between the decode,
    /// per-field resolution and validation phases
    pub fn generate_with_deadline(
        &self,
        vds_no: &str,
        deadline: Option<Instant>,
    ) -> Result<Datasheet, EngineError> {
        let decoded = self.decoder.decode(vds_no, &self.pms)?;
        check_deadline(deadline)?;

        let resolver =
            FieldResolver::new(&self.config, &self.pms, &self.standards, &self.vds_index);
        let mut resolved = Vec::with_capacity(self.config.schema.field_count());
        for section in &self.config.schema.sections {
            for def in &section.fields {
                check_deadline(deadline)?;
                resolved.push(resolver.resolve(def, &section.name, &decoded));
            }
        }

        check_deadline(deadline)?;
        Ok(Assembler::new(&self.config).assemble(&decoded, resolved))
    }

    /// Resolve each code independently; item failures never abort the
    /// batch, and results keep the input order. A deadline expiry cancels
    /// the remaining items and discards computed results.
    pub fn generate_batch(
        &self,
        codes: &[String],
        deadline: Option<Instant>,
    ) -> Result<Vec<BatchItem>, EngineError> {
        let mut results = Vec::with_capacity(codes.len());
        for code in codes {
            match self.generate_with_deadline(code, deadline) {
                Ok(datasheet) => results.push(BatchItem {
                    vds_no: code.clone(),
                    status: BatchStatus::Success,
                    data: Some(datasheet.flat_view()),
                    error: None,
                }),
                Err(EngineError::Timeout) => return Err(EngineError::Timeout),
                Err(EngineError::Input(err)) => results.push(BatchItem {
                    vds_no: code.clone(),
                    status: BatchStatus::Error,
                    data: None,
                    error: Some(err.to_string()),
                }),
            }
        }
        Ok(results)
    }

    /// Choice lists for form UIs and the metadata endpoint
    pub fn metadata(&self) -> EngineMetadata {
        let rules = &self.config.rules;
        EngineMetadata {
            valve_types: rules
                .valve_type_prefixes
                .iter()
                .map(|(prefix, def)| ValveTypeInfo {
                    prefix: prefix.clone(),
                    name: def.name.clone(),
                    primary_standard: def.primary_standard.clone(),
                })
                .collect(),
            piping_classes: self
                .pms
                .all_classes()
                .into_iter()
                .map(str::to_string)
                .collect(),
            end_connections: rules
                .end_connections
                .iter()
                .map(|(code, def)| CodeName {
                    code: code.clone(),
                    name: def.name.clone(),
                    description: Some(def.description.clone()),
                })
                .collect(),
            bore_types: rules
                .bore_types
                .iter()
                .map(|(code, name)| CodeName {
                    code: code.clone(),
                    name: name.clone(),
                    description: None,
                })
                .collect(),
            pressure_classes: self.config.schema.pressure_classes(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn vds_index(&self) -> &VdsIndexRepository {
        &self.vds_index
    }

    pub fn piping_class_count(&self) -> usize {
        self.pms.len()
    }

    pub fn vds_index_count(&self) -> usize {
        self.vds_index.len()
    }

    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

fn check_deadline(deadline: Option<Instant>) -> Result<(), EngineError> {
    match deadline {
        Some(deadline) if Instant::now() > deadline => Err(EngineError::Timeout),
        _ => Ok(()),
    }
}

fn load_repo<R>(
    dir: &Path,
    name: &str,
    from_path: impl Fn(&Path) -> Result<R, RepoError>,
    from_str: impl Fn(&str, &str) -> Result<R, RepoError>,
) -> Result<R, LoadError> {
    let path = dir.join(name);
    if path.exists() {
        Ok(from_path(&path)?)
    } else {
        embedded_repo(name, from_str)
    }
}

fn embedded_repo<R>(
    name: &str,
    from_str: impl Fn(&str, &str) -> Result<R, RepoError>,
) -> Result<R, LoadError> {
    let content = read_default(name).ok_or_else(|| RepoError::MissingEmbedded {
        name: name.to_string(),
    })?;
    Ok(from_str(&content, &format!("embedded:{name}"))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_expired_deadline_returns_timeout() {
        let engine = Engine::with_defaults().unwrap();
        let past = Instant::now() - Duration::from_secs(1);
        assert!(matches!(
            engine.generate_with_deadline("BSFA1R", Some(past)),
            Err(EngineError::Timeout)
        ));
    }

    #[test]
    fn test_batch_timeout_discards_results() {
        let engine = Engine::with_defaults().unwrap();
        let past = Instant::now() - Duration::from_secs(1);
        let codes = vec!["BSFA1R".to_string(), "BSFB1NR".to_string()];
        assert!(matches!(
            engine.generate_batch(&codes, Some(past)),
            Err(EngineError::Timeout)
        ));
    }

    #[test]
    fn test_metadata_lists_choices() {
        let engine = Engine::with_defaults().unwrap();
        let meta = engine.metadata();
        assert!(meta.valve_types.iter().any(|v| v.prefix == "BS"));
        assert!(meta.piping_classes.contains(&"A1".to_string()));
        assert_eq!(meta.pressure_classes.first(), Some(&150));
        assert_eq!(meta.pressure_classes.last(), Some(&2500));
    }
}
