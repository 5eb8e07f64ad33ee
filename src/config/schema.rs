//! Output schema configuration: the ordered field definitions

use serde::Deserialize;
use std::collections::BTreeMap;

/// The output schema loaded from `field_mappings.yaml`.
///
/// The ordered set of field definitions fully determines the shape and
/// order of every generated datasheet.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
    pub sections: Vec<SectionDef>,

    #[serde(default)]
    pub consistency: ConsistencyConfig,
}

/// One datasheet section with its fields in emission order
#[derive(Debug, Clone, Deserialize)]
pub struct SectionDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

/// One field definition
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,

    pub display_name: String,

    #[serde(default)]
    pub required: bool,

    #[serde(flatten)]
    pub rule: SourceRule,
}

/// Source-kind-specific resolution rule.
///
/// The `source` tag selects the variant; each variant carries exactly the
/// parameters its resolution path needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source")]
pub enum SourceRule {
    #[serde(rename = "VDS")]
    Vds {
        attribute: VdsAttribute,

        /// Conditional table for `sour_service`: value when the NACE
        /// modifier is present
        #[serde(default)]
        when_nace: Option<String>,

        /// Conditional table for `sour_service`: value otherwise
        #[serde(default)]
        otherwise: Option<String>,
    },

    #[serde(rename = "PMS")]
    Pms { column: PmsColumn },

    #[serde(rename = "STANDARD")]
    Standard {
        /// Value used when no mandatory clause resolves the field
        fallback: String,

        /// Fallback override for metal-seated valves
        #[serde(default)]
        when_metal_seated: Option<String>,
    },

    #[serde(rename = "PMS_AND_STANDARD")]
    PmsAndStandard {
        /// Material-map component name (e.g. "bolts")
        component: String,
    },

    #[serde(rename = "VDS_INDEX")]
    VdsIndex { column: String },

    #[serde(rename = "CALCULATED")]
    Calculated {
        operand: Operand,
        factor: f64,
        #[serde(default = "default_unit")]
        unit: String,
        #[serde(default)]
        reference: Option<String>,
    },

    #[serde(rename = "FIXED")]
    Fixed { value: String },
}

fn default_unit() -> String {
    "barg".to_string()
}

/// Decoded-VDS attributes a field can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VdsAttribute {
    VdsNo,
    PipingClass,
    ValveType,
    EndConnections,
    PrimaryStandard,
    SourService,
}

/// Piping-class columns a field can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PmsColumn {
    Service,
    PressureClass,
    DesignPressure,
    CorrosionAllowance,
}

/// Operands available to calculated-field formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    DesignPressureMax,
}

/// Cross-field consistency configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsistencyConfig {
    /// Ceiling design pressure (barg) per ASME class
    #[serde(default)]
    pub rating_ceilings: BTreeMap<String, f64>,

    /// ASME class derived from the piping-class letter when a row carries
    /// no numeric rating
    #[serde(default)]
    pub class_letter_ratings: BTreeMap<String, u32>,

    #[serde(default)]
    pub checks: Vec<CrossCheck>,
}

/// One pressure-class / design-pressure consistency pair
#[derive(Debug, Clone, Deserialize)]
pub struct CrossCheck {
    pub pressure_class_field: String,
    pub design_pressure_field: String,
}

impl FieldSchema {
    /// All field definitions in emission order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field_count(&self) -> usize {
        self.fields().count()
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    /// ASME class for a piping-class letter, per the configured table
    pub fn class_for_letter(&self, letter: char) -> Option<u32> {
        self.consistency
            .class_letter_ratings
            .get(&letter.to_string())
            .copied()
    }

    /// Configured ceiling design pressure for an ASME class
    pub fn rating_ceiling(&self, class_numeric: u32) -> Option<f64> {
        self.consistency
            .rating_ceilings
            .get(&class_numeric.to_string())
            .copied()
    }

    /// Pressure classes named in the consistency table, ascending
    pub fn pressure_classes(&self) -> Vec<u32> {
        let mut classes: Vec<u32> = self
            .consistency
            .rating_ceilings
            .keys()
            .filter_map(|k| k.parse().ok())
            .collect();
        classes.sort_unstable();
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::from_document;

    #[test]
    fn test_tagged_rule_parses_each_kind() {
        let yaml = r#"
sections:
  - name: Testing
    fields:
      - name: hydrotest_shell
        display_name: Hydrotest Shell
        required: true
        source: CALCULATED
        operand: design_pressure_max
        factor: 1.5
        reference: API 598
      - name: finish
        display_name: Finish
        source: FIXED
        value: Manufacturer Standard
"#;
        let schema: FieldSchema = from_document(yaml, "fields.yaml").unwrap();
        assert_eq!(schema.field_count(), 2);

        match &schema.sections[0].fields[0].rule {
            SourceRule::Calculated {
                operand,
                factor,
                unit,
                reference,
            } => {
                assert_eq!(*operand, Operand::DesignPressureMax);
                assert_eq!(*factor, 1.5);
                assert_eq!(unit, "barg");
                assert_eq!(reference.as_deref(), Some("API 598"));
            }
            other => panic!("expected CALCULATED rule, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_source_kind_is_rejected() {
        let yaml = r#"
sections:
  - name: Header
    fields:
      - name: vds_no
        display_name: VDS No
        source: ORACLE
"#;
        let result: Result<FieldSchema, _> = from_document(yaml, "fields.yaml");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_operand_is_rejected() {
        let yaml = r#"
sections:
  - name: Testing
    fields:
      - name: hydrotest_shell
        display_name: Hydrotest Shell
        source: CALCULATED
        operand: flow_coefficient
        factor: 1.5
"#;
        let result: Result<FieldSchema, _> = from_document(yaml, "fields.yaml");
        assert!(result.is_err());
    }
}
