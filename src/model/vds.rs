//! Decoded VDS number

use serde::{Deserialize, Serialize};

/// A VDS number parsed into its constituent segments.
///
/// Produced once by the decoder and never mutated. The raw string can be
/// reconstructed from the segments in grammar order (see [`DecodedVds::reconstruct`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedVds {
    /// Normalized input (uppercased, trailing whitespace stripped)
    pub raw: String,

    /// Valve type prefix code (e.g. "BS")
    pub valve_type_prefix: String,

    /// Display name for the prefix (e.g. "Ball Valve")
    pub valve_type_name: String,

    /// Bore type code (e.g. 'F')
    pub bore_type: char,

    /// Display name for the bore (e.g. "Full Bore")
    pub bore_name: String,

    /// Piping class code without modifiers (e.g. "A1")
    pub piping_class: String,

    pub is_nace_compliant: bool,
    pub is_low_temp: bool,
    pub is_metal_seated: bool,

    /// End connection code (e.g. 'R')
    pub end_connection: char,

    /// End connection short name (e.g. "RF")
    pub end_connection_name: String,

    /// Primary design standard for the valve type (e.g. "API 6D / ISO 17292")
    pub primary_standard: String,
}

impl DecodedVds {
    /// Full valve type description, e.g. "Ball Valve, Full Bore"
    pub fn valve_type(&self) -> String {
        format!("{}, {}", self.valve_type_name, self.bore_name)
    }

    /// Active modifier names, in the order they appear in a VDS number
    pub fn modifiers(&self) -> Vec<&'static str> {
        let mut mods = Vec::new();
        if self.is_metal_seated {
            mods.push("Metal Seated");
        }
        if self.is_low_temp {
            mods.push("Low Temperature");
        }
        if self.is_nace_compliant {
            mods.push("NACE");
        }
        mods
    }

    /// Rebuild the VDS string from the decoded segments.
    ///
    /// The metal-seated flag is emitted as a separate character only when
    /// the bore itself is not 'M'; modifier letters are emitted L before N,
    /// matching the class suffix convention (e.g. G1LN).
    pub fn reconstruct(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.valve_type_prefix);
        out.push(self.bore_type);
        if self.is_metal_seated && self.bore_type != 'M' {
            out.push('M');
        }
        out.push_str(&self.piping_class);
        if self.is_low_temp {
            out.push('L');
        }
        if self.is_nace_compliant {
            out.push('N');
        }
        out.push(self.end_connection);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded() -> DecodedVds {
        DecodedVds {
            raw: "BSFMG1LNJ".to_string(),
            valve_type_prefix: "BS".to_string(),
            valve_type_name: "Ball Valve".to_string(),
            bore_type: 'F',
            bore_name: "Full Bore".to_string(),
            piping_class: "G1".to_string(),
            is_nace_compliant: true,
            is_low_temp: true,
            is_metal_seated: true,
            end_connection: 'J',
            end_connection_name: "RTJ".to_string(),
            primary_standard: "API 6D / ISO 17292".to_string(),
        }
    }

    #[test]
    fn test_valve_type_joins_prefix_and_bore() {
        assert_eq!(decoded().valve_type(), "Ball Valve, Full Bore");
    }

    #[test]
    fn test_reconstruct_roundtrips_all_segments() {
        assert_eq!(decoded().reconstruct(), "BSFMG1LNJ");
    }

    #[test]
    fn test_reconstruct_metal_seated_bore_has_no_flag() {
        let mut vds = decoded();
        vds.raw = "BSMG1LNJ".to_string();
        vds.bore_type = 'M';
        assert_eq!(vds.reconstruct(), "BSMG1LNJ");
    }

    #[test]
    fn test_modifiers_listed_in_grammar_order() {
        assert_eq!(
            decoded().modifiers(),
            vec!["Metal Seated", "Low Temperature", "NACE"]
        );
    }
}
