//! Piping-class row model

use serde::{Deserialize, Serialize};

/// One row of the piping material specification.
///
/// Values are kept verbatim as extracted; numeric forms are parsed on
/// demand from the verbatim strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipingClass {
    /// Class code (e.g. "A1", "B1N")
    pub class: String,

    /// Pressure rating as printed (e.g. "150#", "300 lb")
    #[serde(default)]
    pub pressure_rating: String,

    /// Base material spec (e.g. "CS", "SS316")
    #[serde(default)]
    pub base_material: String,

    #[serde(default)]
    pub material_group: String,

    #[serde(default)]
    pub corrosion_allowance: String,

    #[serde(default)]
    pub service: String,

    /// Minimum design pressure with temperature (e.g. "-1.0 barg @ -29°C")
    #[serde(default)]
    pub design_pressure_min: String,

    /// Maximum design pressure with temperature (e.g. "19.6 barg @ 38°C")
    #[serde(default)]
    pub design_pressure_max: String,

    #[serde(default)]
    pub design_temp_min: String,

    #[serde(default)]
    pub design_temp_max: String,
}

impl PipingClass {
    /// Numeric ASME class parsed from the rating string.
    ///
    /// Strips a trailing `#` or `lb` before coercing, so "150#", "150 lb"
    /// and "150" all yield 150.
    pub fn pressure_class_numeric(&self) -> Option<u32> {
        let s = self.pressure_rating.trim();
        let s = s
            .strip_suffix('#')
            .or_else(|| s.strip_suffix("lb"))
            .unwrap_or(s)
            .trim();
        s.parse().ok()
    }

    /// Leading numeric value of the maximum design pressure, in barg
    pub fn design_pressure_max_barg(&self) -> Option<f64> {
        self.design_pressure_max
            .split_whitespace()
            .next()?
            .parse()
            .ok()
    }

    /// Whether the class code carries the NACE suffix letter
    pub fn is_nace_class(&self) -> bool {
        self.modifier_suffix().contains('N')
    }

    /// Whether the class code carries the low-temperature suffix letter
    pub fn is_low_temp_class(&self) -> bool {
        self.modifier_suffix().contains('L')
    }

    fn modifier_suffix(&self) -> &str {
        let trimmed = self.class.trim_end_matches(['L', 'N']);
        &self.class[trimmed.len()..]
    }
}
