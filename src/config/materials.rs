//! Material mapping tables

use serde::Deserialize;
use std::collections::BTreeMap;

/// All material maps, loaded from `material_mappings.yaml`
#[derive(Debug, Clone, Deserialize)]
pub struct MaterialMaps {
    pub base_materials: BTreeMap<String, MaterialMap>,
}

/// Component selections for one base-material key.
///
/// A map may inherit another map's components (single level) and override
/// individual entries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaterialMap {
    #[serde(default)]
    pub inherits: Option<String>,

    #[serde(default)]
    pub components: BTreeMap<String, ComponentSpec>,

    #[serde(default)]
    pub overrides: BTreeMap<String, ComponentSpec>,
}

/// A component entry: a plain spec, a size-branched body spec, or an
/// end-connection-branched spec
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ComponentSpec {
    Plain(String),

    BySize {
        size_threshold: f64,
        forged: String,
        cast: String,
    },

    ByEndConnection(BTreeMap<String, String>),
}

impl MaterialMaps {
    /// Merged component table for a key: inherited components first, then
    /// the map's own components, then its overrides
    pub fn resolved_components(&self, key: &str) -> Option<BTreeMap<&str, &ComponentSpec>> {
        let map = self.base_materials.get(key)?;
        let mut merged: BTreeMap<&str, &ComponentSpec> = BTreeMap::new();

        if let Some(parent_key) = &map.inherits {
            if let Some(parent) = self.base_materials.get(parent_key) {
                for (name, spec) in &parent.components {
                    merged.insert(name, spec);
                }
            }
        }
        for (name, spec) in &map.components {
            merged.insert(name, spec);
        }
        for (name, spec) in &map.overrides {
            merged.insert(name, spec);
        }

        Some(merged)
    }

    /// Whether any map defines the named component
    pub fn defines_component(&self, component: &str) -> bool {
        self.base_materials.keys().any(|key| {
            self.resolved_components(key)
                .is_some_and(|c| c.contains_key(component))
        })
    }

    /// Detect unknown `inherits` targets and inheritance cycles.
    ///
    /// Returns the offending map key on failure.
    pub fn validate_inheritance(&self) -> Result<(), InheritanceError> {
        for (key, map) in &self.base_materials {
            let Some(parent) = &map.inherits else { continue };

            if !self.base_materials.contains_key(parent) {
                return Err(InheritanceError::UnknownBase {
                    map: key.clone(),
                    base: parent.clone(),
                });
            }

            // Walk the inherits chain; revisiting any key is a cycle.
            let mut seen = vec![key.as_str()];
            let mut current = parent.as_str();
            loop {
                if seen.contains(&current) {
                    return Err(InheritanceError::Cycle { map: key.clone() });
                }
                seen.push(current);
                match self.base_materials.get(current).and_then(|m| m.inherits.as_deref()) {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
        Ok(())
    }
}

/// Inheritance problems detected at config load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InheritanceError {
    UnknownBase { map: String, base: String },
    Cycle { map: String },
}
