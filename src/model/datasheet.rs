//! Datasheet output model with per-field traceability

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Where a field value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    Vds,
    Pms,
    Standard,
    PmsAndStandard,
    VdsIndex,
    Calculated,
    Fixed,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceKind::Vds => "VDS",
            SourceKind::Pms => "PMS",
            SourceKind::Standard => "STANDARD",
            SourceKind::PmsAndStandard => "PMS_AND_STANDARD",
            SourceKind::VdsIndex => "VDS_INDEX",
            SourceKind::Calculated => "CALCULATED",
            SourceKind::Fixed => "FIXED",
        };
        write!(f, "{s}")
    }
}

/// Source and derivation record for one resolved field.
///
/// Confidence is 1.0 on every deterministic path; the field is reserved
/// for future heuristic sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traceability {
    pub source_kind: SourceKind,

    /// Source identifier, e.g. "PMS Class A1 (150#)"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_document: Option<String>,

    /// Value as read from the source before formatting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_value: Option<String>,

    /// One-line description of the applied rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation_rule: Option<String>,

    /// Standard clause consulted, when any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause_reference: Option<String>,

    pub confidence: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Traceability {
    pub fn new(source_kind: SourceKind) -> Self {
        Self {
            source_kind,
            source_document: None,
            source_value: None,
            derivation_rule: None,
            clause_reference: None,
            confidence: 1.0,
            notes: None,
        }
    }
}

/// Per-field validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldStatus {
    Ok,
    Missing,
    Empty,
    LowConfidence,
}

/// A single populated (or empty) datasheet field
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub field_name: String,
    pub display_name: String,
    pub section: String,
    pub value: Option<String>,
    pub is_required: bool,
    pub traceability: Traceability,
}

impl ResolvedField {
    /// Whether the field holds a non-empty value
    pub fn is_populated(&self) -> bool {
        self.value
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }

    pub fn validation_status(&self) -> FieldStatus {
        if !self.is_populated() {
            if self.is_required {
                FieldStatus::Missing
            } else {
                FieldStatus::Empty
            }
        } else if self.traceability.confidence < 0.8 {
            FieldStatus::LowConfidence
        } else {
            FieldStatus::Ok
        }
    }
}

impl Serialize for ResolvedField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(8))?;
        map.serialize_entry("field_name", &self.field_name)?;
        map.serialize_entry("display_name", &self.display_name)?;
        map.serialize_entry("section", &self.section)?;
        map.serialize_entry("value", &self.value)?;
        map.serialize_entry("is_required", &self.is_required)?;
        map.serialize_entry("is_populated", &self.is_populated())?;
        map.serialize_entry("validation_status", &self.validation_status())?;
        map.serialize_entry("traceability", &self.traceability)?;
        map.end()
    }
}

/// Overall datasheet validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Warnings,
    Invalid,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationStatus::Valid => write!(f, "valid"),
            ValidationStatus::Warnings => write!(f, "warnings"),
            ValidationStatus::Invalid => write!(f, "invalid"),
        }
    }
}

/// Field population counts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub populated: usize,
    pub total: usize,
    /// Populated share in percent, rounded to one decimal
    pub percentage: f64,
}

/// Datasheet generation metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasheetMetadata {
    pub generated_at: DateTime<Utc>,
    pub generation_version: String,
    pub vds_no: String,
    pub completion: Completion,
    pub validation_status: ValidationStatus,
    pub validation_errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// One schema section with its fields in schema order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub fields: Vec<ResolvedField>,
}

/// A complete generated datasheet.
///
/// Sections appear exactly in schema order; every schema field appears
/// exactly once across the sections.
#[derive(Debug, Clone, PartialEq)]
pub struct Datasheet {
    pub metadata: DatasheetMetadata,
    pub sections: Vec<Section>,
}

impl Datasheet {
    /// All fields in emission order
    pub fn fields(&self) -> impl Iterator<Item = &ResolvedField> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Look up a field by schema name
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields().find(|f| f.field_name == name)
    }

    /// Value of a field by schema name, when populated
    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(|f| f.value.as_deref())
    }

    /// Flat projection: field name to value, populated fields only,
    /// in schema order
    pub fn flat(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut out = serde_json::Map::new();
        for field in self.fields().filter(|f| f.is_populated()) {
            if let Some(value) = &field.value {
                out.insert(
                    field.field_name.clone(),
                    serde_json::Value::String(value.clone()),
                );
            }
        }
        out
    }

    /// Flat view carrying completion and validation alongside the values
    pub fn flat_view(&self) -> FlatView {
        FlatView {
            vds_no: self.metadata.vds_no.clone(),
            data: self.flat(),
            validation_status: self.metadata.validation_status,
            completion: self.metadata.completion,
        }
    }
}

impl Serialize for Datasheet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct SectionsMap<'a>(&'a [Section]);

        impl Serialize for SectionsMap<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for section in self.0 {
                    map.serialize_entry(&section.name, &section.fields)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("metadata", &self.metadata)?;
        map.serialize_entry("sections", &SectionsMap(&self.sections))?;
        map.end()
    }
}

/// The flat serialization of a datasheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatView {
    pub vds_no: String,
    pub data: serde_json::Map<String, serde_json::Value>,
    pub validation_status: ValidationStatus,
    pub completion: Completion,
}
