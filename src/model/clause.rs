//! Standard clause model

use serde::{Deserialize, Serialize};

/// Classification of a standard clause.
///
/// Unrecognized strings from the extractor read as informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
#[derive(Default)]
pub enum RuleType {
    Mandatory,
    Recommendation,
    #[default]
    Informational,
    Formula,
    Definition,
}

impl From<String> for RuleType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "mandatory" => RuleType::Mandatory,
            "recommendation" => RuleType::Recommendation,
            "formula" => RuleType::Formula,
            "definition" => RuleType::Definition,
            _ => RuleType::Informational,
        }
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleType::Mandatory => write!(f, "mandatory"),
            RuleType::Recommendation => write!(f, "recommendation"),
            RuleType::Informational => write!(f, "informational"),
            RuleType::Formula => write!(f, "formula"),
            RuleType::Definition => write!(f, "definition"),
        }
    }
}

/// A single clause extracted from a valve standard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardClause {
    /// Standard name (e.g. "API 598")
    pub standard: String,

    #[serde(default)]
    pub section: String,

    /// Clause number within the standard (e.g. "4.1")
    pub clause: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub page: Option<u32>,

    #[serde(default)]
    pub rule_type: RuleType,

    /// Valve type names this clause applies to; "All Valves" is a wildcard
    #[serde(default)]
    pub applies_to: Vec<String>,

    /// Datasheet field this clause resolves, when any
    #[serde(default)]
    pub datasheet_field: Option<String>,
}



impl StandardClause {
    /// Full reference string, e.g. "API 598 4.1"
    pub fn full_reference(&self) -> String {
        if self.clause.is_empty() {
            self.standard.clone()
        } else {
            format!("{} {}", self.standard, self.clause)
        }
    }

    /// Whether the clause applies to the given valve type name
    pub fn applies_to_valve_type(&self, valve_type: &str) -> bool {
        self.applies_to
            .iter()
            .any(|v| v == valve_type || v == "All Valves")
    }

    pub fn is_mandatory(&self) -> bool {
        self.rule_type == RuleType::Mandatory
    }
}
