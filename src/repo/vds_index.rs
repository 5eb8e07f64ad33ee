//! VDS index repository: pre-computed datasheet values keyed by VDS code

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::repo::RepoError;

/// One pre-computed row of the VDS index.
///
/// Columns beyond the key are kept as-is; values that cannot be derived
/// from rules alone (size range, trim materials) live here.
#[derive(Debug, Clone, Deserialize)]
pub struct VdsIndexRow {
    pub vds_no: String,

    #[serde(flatten)]
    values: BTreeMap<String, serde_json::Value>,
}

impl VdsIndexRow {
    /// Column value rendered as a string, when present and non-empty
    pub fn get(&self, column: &str) -> Option<String> {
        match self.values.get(column)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Representative valve size in inches, when the extractor recorded one
    pub fn representative_size(&self) -> Option<f64> {
        self.values.get("size")?.as_f64()
    }
}

/// Read-only index from full VDS code to its pre-computed row
#[derive(Debug, Clone, Default)]
pub struct VdsIndexRepository {
    rows: BTreeMap<String, VdsIndexRow>,
}

impl VdsIndexRepository {
    /// Parse the VDS index JSON: a top-level array of row objects
    pub fn from_json_str(content: &str, file: &str) -> Result<Self, RepoError> {
        let rows: Vec<VdsIndexRow> =
            serde_json::from_str(content).map_err(|source| RepoError::Json {
                file: file.to_string(),
                source,
            })?;

        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.vds_no = row.vds_no.trim().to_uppercase();
                (row.vds_no.clone(), row)
            })
            .collect();

        Ok(Self { rows })
    }

    pub fn from_path(path: &Path) -> Result<Self, RepoError> {
        let content = std::fs::read_to_string(path).map_err(|source| RepoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content, &path.display().to_string())
    }

    pub fn row_for(&self, vds_no: &str) -> Option<&VdsIndexRow> {
        self.rows.get(vds_no.trim().to_uppercase().as_str())
    }

    pub fn contains(&self, vds_no: &str) -> bool {
        self.row_for(vds_no).is_some()
    }

    /// All indexed VDS codes, sorted, optionally filtered by prefix
    pub fn all_codes(&self, prefix_filter: Option<&str>) -> Vec<&str> {
        let filter = prefix_filter.map(str::to_uppercase);
        self.rows
            .keys()
            .filter(|code| {
                filter
                    .as_deref()
                    .is_none_or(|p| code.starts_with(p))
            })
            .map(String::as_str)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::embedded::read_default;

    fn repo() -> VdsIndexRepository {
        let content = read_default("vds_index.json").unwrap();
        VdsIndexRepository::from_json_str(&content, "vds_index.json").unwrap()
    }

    #[test]
    fn test_row_lookup_normalizes_case() {
        let repo = repo();
        assert!(repo.contains("bsfa1r"));
        let row = repo.row_for("BSFA1R").unwrap();
        assert_eq!(row.get("seat_material").as_deref(), Some("Reinforced PTFE"));
    }

    #[test]
    fn test_missing_row_is_none() {
        assert!(repo().row_for("BSFE1R").is_none());
    }

    #[test]
    fn test_representative_size() {
        let repo = repo();
        assert_eq!(
            repo.row_for("BSFMG1LNJ").unwrap().representative_size(),
            Some(1.0)
        );
    }

    #[test]
    fn test_prefix_filter() {
        let repo = repo();
        let ball = repo.all_codes(Some("BS"));
        assert!(ball.iter().all(|c| c.starts_with("BS")));
        assert!(repo.all_codes(Some("GS")).contains(&"GSRD1W"));
        assert_eq!(repo.all_codes(None).len(), repo.len());
    }

    #[test]
    fn test_empty_string_columns_read_as_absent() {
        let json = r#"[{"vds_no": "BSFA1R", "ball_material": "  "}]"#;
        let repo = VdsIndexRepository::from_json_str(json, "test.json").unwrap();
        assert_eq!(repo.row_for("BSFA1R").unwrap().get("ball_material"), None);
    }
}
