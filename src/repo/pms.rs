//! PMS repository: piping-class rows indexed by class code

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::model::PipingClass;
use crate::repo::RepoError;

/// Read-only index over the piping material specification.
///
/// Built once from the extracted-Excel JSON; lookups are O(log n) over a
/// small table and never touch the filesystem.
#[derive(Debug, Clone, Default)]
pub struct PmsRepository {
    classes: BTreeMap<String, PipingClass>,
}

/// Extracted-Excel file shape: sheets of header/row tables
#[derive(Debug, Deserialize)]
struct PipingSpecFile {
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    #[serde(default)]
    tables: Vec<Table>,
}

#[derive(Debug, Deserialize)]
struct Table {
    #[serde(default)]
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<BTreeMap<String, serde_json::Value>>,
}

impl PmsRepository {
    /// Parse the extracted piping specification JSON.
    ///
    /// Scans every sheet for tables whose headers include "Piping Class"
    /// and indexes their rows.
    pub fn from_json_str(content: &str, file: &str) -> Result<Self, RepoError> {
        let spec: PipingSpecFile =
            serde_json::from_str(content).map_err(|source| RepoError::Json {
                file: file.to_string(),
                source,
            })?;

        let mut classes = BTreeMap::new();
        for sheet in &spec.sheets {
            for table in &sheet.tables {
                if !table.headers.iter().any(|h| h == "Piping Class") {
                    continue;
                }
                for row in &table.rows {
                    if let Some(class) = parse_row(row) {
                        classes.insert(class.class.clone(), class);
                    }
                }
            }
        }

        Ok(Self { classes })
    }

    pub fn from_path(path: &Path) -> Result<Self, RepoError> {
        let content = std::fs::read_to_string(path).map_err(|source| RepoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content, &path.display().to_string())
    }

    /// Build directly from rows (used by tests)
    pub fn from_classes(rows: Vec<PipingClass>) -> Self {
        let classes = rows.into_iter().map(|r| (r.class.clone(), r)).collect();
        Self { classes }
    }

    pub fn class_for(&self, class: &str) -> Option<&PipingClass> {
        self.classes.get(class.trim().to_uppercase().as_str())
    }

    pub fn contains(&self, class: &str) -> bool {
        self.class_for(class).is_some()
    }

    /// All class codes, sorted
    pub fn all_classes(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    /// Numeric and verbatim pressure rating for a class
    pub fn pressure_rating_of(&self, class: &str) -> Option<(u32, &str)> {
        let row = self.class_for(class)?;
        Some((row.pressure_class_numeric()?, row.pressure_rating.as_str()))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Extract one piping-class row, tolerating the extractor's varying
/// column labels. Rows whose class cell is not a class code are skipped.
fn parse_row(row: &BTreeMap<String, serde_json::Value>) -> Option<PipingClass> {
    let class = cell(row, &["Piping Class", "piping_class"])?;
    let class = class.trim().to_uppercase();

    // Label rows like "Design Code: ASME B31.3" share the table.
    if class.is_empty() || class.contains(':') || !looks_like_class(&class) {
        return None;
    }

    Some(PipingClass {
        class,
        pressure_rating: cell(row, &["Rating", "Pressure Rating", "pressure_rating"])
            .unwrap_or_default(),
        base_material: cell(row, &["Material", "Base Material", "base_material"])
            .unwrap_or_default(),
        material_group: cell(row, &["Material Group", "material_group"]).unwrap_or_default(),
        corrosion_allowance: cell(row, &["C.A", "CA", "Corrosion Allowance"]).unwrap_or_default(),
        service: cell(row, &["Service", "service"]).unwrap_or_default(),
        design_pressure_min: cell(row, &["Design Pressure Min", "design_pressure_min"])
            .unwrap_or_default(),
        design_pressure_max: cell(row, &["Design Pressure Max", "design_pressure_max"])
            .unwrap_or_default(),
        design_temp_min: cell(row, &["Design Temp Min", "design_temp_min"]).unwrap_or_default(),
        design_temp_max: cell(row, &["Design Temp Max", "design_temp_max"]).unwrap_or_default(),
    })
}

fn cell(row: &BTreeMap<String, serde_json::Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        match row.get(*key) {
            Some(serde_json::Value::String(s)) => return Some(s.trim().to_string()),
            Some(serde_json::Value::Number(n)) => return Some(n.to_string()),
            _ => continue,
        }
    }
    None
}

/// Class letter(s) then digits then optional L/N modifier suffix
fn looks_like_class(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    let mut letters = 0;
    while chars.peek().is_some_and(|c| c.is_ascii_uppercase()) {
        letters += 1;
        chars.next();
    }
    let mut digits = 0;
    while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
        digits += 1;
        chars.next();
    }
    let suffix_ok = chars.all(|c| c == 'L' || c == 'N');
    letters >= 1 && digits >= 1 && suffix_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::embedded::read_default;

    fn repo() -> PmsRepository {
        let content = read_default("piping_spec.json").unwrap();
        PmsRepository::from_json_str(&content, "piping_spec.json").unwrap()
    }

    #[test]
    fn test_loads_all_default_classes() {
        let repo = repo();
        assert_eq!(
            repo.all_classes(),
            vec!["A1", "B1", "C1", "D1", "E1", "F1", "G1"]
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let repo = repo();
        assert!(repo.contains("a1"));
        assert!(repo.contains(" A1 "));
        assert!(!repo.contains("Z9"));
    }

    #[test]
    fn test_pressure_rating_numeric_and_verbatim() {
        let repo = repo();
        assert_eq!(repo.pressure_rating_of("A1"), Some((150, "150#")));
        assert_eq!(repo.pressure_rating_of("G1"), Some((2500, "2500#")));
    }

    #[test]
    fn test_label_rows_are_skipped() {
        let json = r#"{
            "sheets": [{
                "sheetName": "PMS",
                "tables": [{
                    "headers": ["Piping Class", "Rating"],
                    "rows": [
                        {"Piping Class": "Design Code: ASME B31.3", "Rating": ""},
                        {"Piping Class": "A1", "Rating": "150#"}
                    ]
                }]
            }]
        }"#;
        let repo = PmsRepository::from_json_str(json, "test.json").unwrap();
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_tables_without_class_header_ignored() {
        let json = r#"{
            "sheets": [{
                "sheetName": "Notes",
                "tables": [{
                    "headers": ["Note"],
                    "rows": [{"Note": "A1"}]
                }]
            }]
        }"#;
        let repo = PmsRepository::from_json_str(json, "test.json").unwrap();
        assert!(repo.is_empty());
    }
}
