//! Rulebook parsing
//!
//! Every configuration document is YAML. Parse failures keep the document's
//! provenance (file path or embedded name) and point a labeled span at the
//! offending spot, so a broken rulebook is diagnosable without opening it.

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A rulebook document that could not be loaded
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error("failed to read rulebook {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed rulebook {label}: {message}")]
    #[diagnostic(code(vdt::rulebook::malformed))]
    Malformed {
        label: String,
        message: String,

        #[source_code]
        src: NamedSource<String>,

        #[label("problem is here")]
        span: Option<SourceSpan>,
    },
}

/// Parse rulebook content, labeling diagnostics with the document name
pub fn from_document<T: DeserializeOwned>(content: &str, label: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content).map_err(|err| {
        let span = err
            .location()
            .map(|loc| SourceSpan::new(loc.index().into(), 1));
        YamlError::Malformed {
            label: label.to_string(),
            message: err.to_string(),
            src: NamedSource::new(label, content.to_string()),
            span,
        }
    })
}

/// Read and parse a rulebook file
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path).map_err(|source| YamlError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_document(&content, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VdsRules;

    const GRAMMAR: &str = r#"
valve_type_prefixes:
  BS: { name: Ball Valve, primary_standard: API 6D / ISO 17292 }
bore_types:
  F: Full Bore
end_connections:
  R: { name: RF, description: Flanged ASME B16.5 RF }
modifiers:
  N: nace
piping_class_pattern: "[A-G][0-9]+"
"#;

    #[test]
    fn test_grammar_document_parses() {
        let rules: VdsRules = from_document(GRAMMAR, "vds_rules.yaml").unwrap();
        assert_eq!(rules.valve_type_prefixes["BS"].name, "Ball Valve");
        assert_eq!(rules.piping_class_pattern, "[A-G][0-9]+");
    }

    #[test]
    fn test_malformed_document_keeps_provenance() {
        let result: Result<VdsRules, _> = from_document("bore_types: [unclosed", "vds_rules.yaml");
        match result {
            Err(YamlError::Malformed { label, .. }) => assert_eq!(label, "vds_rules.yaml"),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_reports_read_error() {
        let result: Result<VdsRules, _> = load(Path::new("/nonexistent/vds_rules.yaml"));
        assert!(matches!(result, Err(YamlError::Read { .. })));
    }
}
