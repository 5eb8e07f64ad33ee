//! Standards repository: clause store with field / valve-type / standard indexes

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::model::{RuleType, StandardClause};
use crate::repo::RepoError;

/// Read-only index over extracted standard clauses
#[derive(Debug, Clone, Default)]
pub struct StandardsRepository {
    clauses: Vec<StandardClause>,
    by_field: BTreeMap<String, Vec<usize>>,
    by_valve_type: BTreeMap<String, Vec<usize>>,
    by_standard: BTreeMap<String, Vec<usize>>,
}

#[derive(Debug, Deserialize)]
struct ClausesFile {
    clauses: Vec<StandardClause>,
}

impl StandardsRepository {
    pub fn from_json_str(content: &str, file: &str) -> Result<Self, RepoError> {
        let parsed: ClausesFile =
            serde_json::from_str(content).map_err(|source| RepoError::Json {
                file: file.to_string(),
                source,
            })?;
        Ok(Self::from_clauses(parsed.clauses))
    }

    pub fn from_path(path: &Path) -> Result<Self, RepoError> {
        let content = std::fs::read_to_string(path).map_err(|source| RepoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content, &path.display().to_string())
    }

    pub fn from_clauses(clauses: Vec<StandardClause>) -> Self {
        let mut repo = Self {
            clauses,
            ..Default::default()
        };
        for (i, clause) in repo.clauses.iter().enumerate() {
            if let Some(field) = &clause.datasheet_field {
                repo.by_field.entry(field.clone()).or_default().push(i);
            }
            for valve_type in &clause.applies_to {
                repo.by_valve_type
                    .entry(valve_type.clone())
                    .or_default()
                    .push(i);
            }
            repo.by_standard
                .entry(clause.standard.clone())
                .or_default()
                .push(i);
        }
        repo
    }

    /// Clauses mapped to a datasheet field, in load order
    pub fn clauses_for_field(&self, field: &str) -> Vec<&StandardClause> {
        self.indexed(&self.by_field, field)
    }

    /// Clauses applying to a valve type (not including the wildcard)
    pub fn clauses_for_valve_type(&self, valve_type: &str) -> Vec<&StandardClause> {
        self.indexed(&self.by_valve_type, valve_type)
    }

    pub fn clauses_for_standard(&self, standard: &str) -> Vec<&StandardClause> {
        self.indexed(&self.by_standard, standard)
    }

    /// The mandatory clause resolving a field for a valve type, when one
    /// exists. Multiple matches resolve to the first in load order.
    pub fn value_for_field(&self, field: &str, valve_type: &str) -> Option<&StandardClause> {
        self.clauses_for_field(field)
            .into_iter()
            .find(|c| c.rule_type == RuleType::Mandatory && c.applies_to_valve_type(valve_type))
    }

    pub fn standards(&self) -> Vec<&str> {
        self.by_standard.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    fn indexed<'a>(
        &'a self,
        index: &'a BTreeMap<String, Vec<usize>>,
        key: &str,
    ) -> Vec<&'a StandardClause> {
        index
            .get(key)
            .map(|ids| ids.iter().map(|&i| &self.clauses[i]).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::embedded::read_default;

    fn repo() -> StandardsRepository {
        let content = read_default("clauses.json").unwrap();
        StandardsRepository::from_json_str(&content, "clauses.json").unwrap()
    }

    #[test]
    fn test_mandatory_clause_resolves_field() {
        let repo = repo();
        let clause = repo.value_for_field("inspection_testing", "Ball Valve").unwrap();
        assert_eq!(clause.text, "API 598");
        assert_eq!(clause.full_reference(), "API 598 4.1");
    }

    #[test]
    fn test_wildcard_applies_to_every_valve_type() {
        let repo = repo();
        assert!(repo.value_for_field("face_to_face", "Needle Valve").is_some());
    }

    #[test]
    fn test_recommendation_clauses_do_not_resolve_values() {
        let repo = repo();
        // fire_rating has only a recommendation clause.
        assert!(repo.value_for_field("fire_rating", "Ball Valve").is_none());
    }

    #[test]
    fn test_valve_type_scoping() {
        let repo = repo();
        // leakage_rate's mandatory clause names specific valve types.
        assert!(repo.value_for_field("leakage_rate", "Ball Valve").is_some());
        assert!(repo.value_for_field("leakage_rate", "Butterfly Valve").is_none());
    }

    #[test]
    fn test_indexes_by_standard() {
        let repo = repo();
        assert_eq!(repo.clauses_for_standard("API 598").len(), 1);
        assert!(repo.standards().contains(&"ISO 5208"));
    }
}
