//! Configuration loading and startup validation

pub mod embedded;
pub mod materials;
pub mod rules;
pub mod schema;

pub use materials::{ComponentSpec, MaterialMap, MaterialMaps};
pub use rules::{EndConnectionDef, ModifierFlag, PrefixDef, VdsRules};
pub use schema::{
    ConsistencyConfig, CrossCheck, FieldDef, FieldSchema, Operand, PmsColumn, SourceRule,
    VdsAttribute,
};

use miette::Diagnostic;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

use crate::yaml::{self, YamlError};
use materials::InheritanceError;

/// File names the loader looks for in the config-and-data directory
pub const RULES_FILE: &str = "vds_rules.yaml";
pub const FIELDS_FILE: &str = "field_mappings.yaml";
pub const MATERIALS_FILE: &str = "material_mappings.yaml";

/// Immutable engine configuration, loaded once at startup.
///
/// Constructed explicitly and injected into the repositories and the
/// resolver; there is no global configuration state.
#[derive(Debug, Clone)]
pub struct Config {
    pub rules: VdsRules,
    pub schema: FieldSchema,
    pub materials: MaterialMaps,

    /// Anchored piping-class matcher compiled from the grammar pattern
    pub class_regex: Regex,

    /// Non-fatal findings from load-time validation
    pub warnings: Vec<String>,
}

/// Startup configuration failures; the process refuses to serve on any of
/// these
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("embedded default {name} is missing")]
    MissingEmbedded { name: String },

    #[error("duplicate field {name} in field mappings")]
    DuplicateField { name: String },

    #[error("invalid grammar: {message}")]
    InvalidGrammar { message: String },

    #[error("invalid piping class pattern {pattern:?}: {message}")]
    BadClassPattern { pattern: String, message: String },

    #[error("material map {map} inherits unknown base {base}")]
    UnknownInheritBase { map: String, base: String },

    #[error("material map {map} participates in an inheritance cycle")]
    InheritanceCycle { map: String },

    #[error("field {field} uses a conditional VDS attribute and needs when_nace and otherwise values")]
    MissingConditionTable { field: String },
}

impl Config {
    /// Load the three rulebooks from a directory, falling back to the
    /// embedded defaults for any file the directory does not provide
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let rules = load_document(dir, RULES_FILE)?;
        let schema = load_document(dir, FIELDS_FILE)?;
        let materials = load_document(dir, MATERIALS_FILE)?;
        Self::from_parts(rules, schema, materials)
    }

    /// Build a configuration entirely from the embedded defaults
    pub fn embedded() -> Result<Self, ConfigError> {
        let rules = parse_embedded(RULES_FILE)?;
        let schema = parse_embedded(FIELDS_FILE)?;
        let materials = parse_embedded(MATERIALS_FILE)?;
        Self::from_parts(rules, schema, materials)
    }

    /// Validate and assemble a configuration from parsed parts
    pub fn from_parts(
        rules: VdsRules,
        schema: FieldSchema,
        materials: MaterialMaps,
    ) -> Result<Self, ConfigError> {
        rules
            .single_char_keys_valid()
            .map_err(|message| ConfigError::InvalidGrammar { message })?;

        let class_regex = Regex::new(&format!("^(?:{})", rules.piping_class_pattern)).map_err(
            |e| ConfigError::BadClassPattern {
                pattern: rules.piping_class_pattern.clone(),
                message: e.to_string(),
            },
        )?;

        let mut seen = BTreeSet::new();
        for field in schema.fields() {
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::DuplicateField {
                    name: field.name.clone(),
                });
            }
            if let SourceRule::Vds {
                attribute: VdsAttribute::SourService,
                when_nace,
                otherwise,
            } = &field.rule
            {
                if when_nace.is_none() || otherwise.is_none() {
                    return Err(ConfigError::MissingConditionTable {
                        field: field.name.clone(),
                    });
                }
            }
        }

        materials.validate_inheritance().map_err(|e| match e {
            InheritanceError::UnknownBase { map, base } => {
                ConfigError::UnknownInheritBase { map, base }
            }
            InheritanceError::Cycle { map } => ConfigError::InheritanceCycle { map },
        })?;

        // A field naming a component no map defines is suspicious but not
        // fatal: the field simply cannot populate.
        let mut warnings = Vec::new();
        for field in schema.fields() {
            if let SourceRule::PmsAndStandard { component } = &field.rule {
                if !materials.defines_component(component) {
                    warnings.push(format!(
                        "field {} references material component {} not defined in any material map",
                        field.name, component
                    ));
                }
            }
        }

        Ok(Self {
            rules,
            schema,
            materials,
            class_regex,
            warnings,
        })
    }
}

fn load_document<T: serde::de::DeserializeOwned>(
    dir: &Path,
    name: &str,
) -> Result<T, ConfigError> {
    let path = dir.join(name);
    if path.exists() {
        Ok(yaml::load(&path)?)
    } else {
        parse_embedded(name)
    }
}

fn parse_embedded<T: serde::de::DeserializeOwned>(name: &str) -> Result<T, ConfigError> {
    let content = embedded::read_default(name).ok_or_else(|| ConfigError::MissingEmbedded {
        name: name.to_string(),
    })?;
    Ok(yaml::from_document(&content, &format!("embedded:{name}"))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::from_document;

    #[test]
    fn test_embedded_config_loads_and_validates() {
        let config = Config::embedded().unwrap();
        assert_eq!(config.schema.field_count(), 40);
        assert!(config.warnings.is_empty(), "{:?}", config.warnings);
        assert!(config.class_regex.is_match("A1"));
        assert!(!config.class_regex.is_match("1A"));
    }

    #[test]
    fn test_duplicate_field_name_rejected() {
        let rules: VdsRules = parse_embedded(RULES_FILE).unwrap();
        let materials: MaterialMaps = parse_embedded(MATERIALS_FILE).unwrap();
        let schema: FieldSchema = from_document(
            r#"
sections:
  - name: Header
    fields:
      - { name: vds_no, display_name: VDS No, source: VDS, attribute: vds_no }
      - { name: vds_no, display_name: VDS No, source: VDS, attribute: vds_no }
"#,
            "fields.yaml",
        )
        .unwrap();

        assert!(matches!(
            Config::from_parts(rules, schema, materials),
            Err(ConfigError::DuplicateField { name }) if name == "vds_no"
        ));
    }

    #[test]
    fn test_sour_service_requires_condition_table() {
        let rules: VdsRules = parse_embedded(RULES_FILE).unwrap();
        let materials: MaterialMaps = parse_embedded(MATERIALS_FILE).unwrap();
        let schema: FieldSchema = from_document(
            r#"
sections:
  - name: Design
    fields:
      - { name: sour_service, display_name: Sour Service, source: VDS, attribute: sour_service }
"#,
            "fields.yaml",
        )
        .unwrap();

        assert!(matches!(
            Config::from_parts(rules, schema, materials),
            Err(ConfigError::MissingConditionTable { field }) if field == "sour_service"
        ));
    }

    #[test]
    fn test_unknown_component_is_warning_not_error() {
        let rules: VdsRules = parse_embedded(RULES_FILE).unwrap();
        let materials: MaterialMaps = parse_embedded(MATERIALS_FILE).unwrap();
        let schema: FieldSchema = from_document(
            r#"
sections:
  - name: Material
    fields:
      - { name: diaphragm, display_name: Diaphragm, source: PMS_AND_STANDARD, component: diaphragm }
"#,
            "fields.yaml",
        )
        .unwrap();

        let config = Config::from_parts(rules, schema, materials).unwrap();
        assert_eq!(config.warnings.len(), 1);
        assert!(config.warnings[0].contains("diaphragm"));
    }

    #[test]
    fn test_bad_class_pattern_rejected() {
        let mut rules: VdsRules = parse_embedded(RULES_FILE).unwrap();
        rules.piping_class_pattern = "[A-G".to_string();
        let materials: MaterialMaps = parse_embedded(MATERIALS_FILE).unwrap();
        let schema: FieldSchema = parse_embedded(FIELDS_FILE).unwrap();

        assert!(matches!(
            Config::from_parts(rules, schema, materials),
            Err(ConfigError::BadClassPattern { .. })
        ));
    }
}
