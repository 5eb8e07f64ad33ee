//! VDS grammar configuration

use serde::Deserialize;
use std::collections::BTreeMap;

/// Declarative VDS decoding grammar, loaded from `vds_rules.yaml`
#[derive(Debug, Clone, Deserialize)]
pub struct VdsRules {
    /// Valve-type prefixes keyed by code (e.g. "BS")
    pub valve_type_prefixes: BTreeMap<String, PrefixDef>,

    /// Bore codes to display names (e.g. "F" -> "Full Bore")
    pub bore_types: BTreeMap<String, String>,

    /// End-connection codes to name and description
    pub end_connections: BTreeMap<String, EndConnectionDef>,

    /// Modifier letters to the flag they set
    pub modifiers: BTreeMap<String, ModifierFlag>,

    /// Regular expression matching a piping-class code (unanchored)
    pub piping_class_pattern: String,
}

/// One valve-type prefix entry
#[derive(Debug, Clone, Deserialize)]
pub struct PrefixDef {
    /// Display name (e.g. "Ball Valve")
    pub name: String,

    /// Primary design standard (e.g. "API 6D / ISO 17292")
    pub primary_standard: String,

    /// Whether this valve type encodes metal seating as a separate 'M'
    /// character after the bore type
    #[serde(default)]
    pub metal_seated_flag: bool,
}

/// One end-connection entry
#[derive(Debug, Clone, Deserialize)]
pub struct EndConnectionDef {
    /// Short name (e.g. "RF")
    pub name: String,

    /// Datasheet description (e.g. "Flanged ASME B16.5 RF")
    pub description: String,
}

/// Flag set by a modifier letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierFlag {
    Nace,
    LowTemp,
}

impl VdsRules {
    /// Prefix codes ordered longest first for greedy matching
    pub fn prefixes_longest_first(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.valve_type_prefixes.keys().map(String::as_str).collect();
        codes.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        codes
    }

    /// Single-character grammar keys must really be single characters
    pub fn single_char_keys_valid(&self) -> Result<(), String> {
        for key in self
            .bore_types
            .keys()
            .chain(self.end_connections.keys())
            .chain(self.modifiers.keys())
        {
            if key.chars().count() != 1 {
                return Err(format!("grammar key {key:?} must be a single character"));
            }
        }
        Ok(())
    }

    pub fn bore_name(&self, code: char) -> Option<&str> {
        self.bore_types.get(&code.to_string()).map(String::as_str)
    }

    pub fn end_connection(&self, code: char) -> Option<&EndConnectionDef> {
        self.end_connections.get(&code.to_string())
    }

    pub fn modifier(&self, code: char) -> Option<ModifierFlag> {
        self.modifiers.get(&code.to_string()).copied()
    }
}
