//! Material selection for PMS_AND_STANDARD fields

use crate::config::{ComponentSpec, MaterialMaps};
use crate::engine::resolver::ResolveError;
use crate::model::DecodedVds;

/// Outcome of a material lookup, with enough context for traceability
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSelection {
    pub value: String,

    /// Key composed from the decoded flags (e.g. "LTCS_NACE")
    pub requested_key: String,

    /// Key whose map supplied the value; differs from `requested_key`
    /// when an ancestor fallback occurred
    pub key: String,

    /// Branch taken inside a sub-mapping, when any
    pub branch: Option<String>,
}

/// Compose the material key: `LT` prefix for low temperature, `_NACE`
/// suffix for sour service (so the order is LTCS, LTCS_NACE)
pub fn compose_key(base: &str, is_low_temp: bool, is_nace: bool) -> String {
    let mut key = String::new();
    if is_low_temp {
        key.push_str("LT");
    }
    key.push_str(base);
    if is_nace {
        key.push_str("_NACE");
    }
    key
}

/// Select the material spec for one component.
///
/// Falls back from the composed key to the nearest defined ancestor in
/// the order {LT,NACE} -> NACE -> base.
pub fn select_material(
    maps: &MaterialMaps,
    base_material: &str,
    vds: &DecodedVds,
    component: &str,
    representative_size: Option<f64>,
) -> Result<MaterialSelection, ResolveError> {
    let base = base_material.trim();
    let base = if base.is_empty() { "CS" } else { base };

    let requested_key = compose_key(base, vds.is_low_temp, vds.is_nace_compliant);
    let mut candidates = vec![requested_key.clone()];
    if vds.is_low_temp && vds.is_nace_compliant {
        candidates.push(format!("{base}_NACE"));
    }
    candidates.push(base.to_string());
    candidates.dedup();

    let key = candidates
        .into_iter()
        .find(|k| maps.base_materials.contains_key(k))
        .ok_or_else(|| ResolveError::UnknownMaterial {
            key: requested_key.clone(),
        })?;

    let components = maps
        .resolved_components(&key)
        .ok_or_else(|| ResolveError::UnknownMaterial { key: key.clone() })?;

    let spec = components
        .get(component)
        .ok_or_else(|| ResolveError::UnknownComponent {
            component: component.to_string(),
            key: key.clone(),
        })?;

    let (value, branch) = match spec {
        ComponentSpec::Plain(value) => (value.clone(), None),

        ComponentSpec::BySize {
            size_threshold,
            forged,
            cast,
        } => match representative_size {
            Some(size) if size <= *size_threshold => (
                forged.clone(),
                Some(format!("forged (size {size} <= {size_threshold})")),
            ),
            Some(size) => (
                cast.clone(),
                Some(format!("cast (size {size} > {size_threshold})")),
            ),
            None => (
                format!("{forged}, {cast}"),
                Some("forged and cast (no representative size)".to_string()),
            ),
        },

        ComponentSpec::ByEndConnection(by_end) => {
            let end = vds.end_connection_name.as_str();
            let value = by_end
                .get(end)
                .or_else(|| by_end.get("RF"))
                .ok_or_else(|| ResolveError::UnknownComponent {
                    component: component.to_string(),
                    key: key.clone(),
                })?;
            (value.clone(), Some(format!("end connection {end}")))
        }
    };

    Ok(MaterialSelection {
        value,
        requested_key,
        key,
        branch,
    })
}
