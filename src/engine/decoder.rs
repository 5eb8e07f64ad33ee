//! Grammar-directed VDS number parser

use miette::Diagnostic;
use regex::Regex;
use thiserror::Error;

use crate::config::{Config, ModifierFlag, VdsRules};
use crate::model::DecodedVds;
use crate::repo::PmsRepository;

/// Invalid VDS input, with the offending segment
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown valve type prefix {segment:?} in {vds}")]
    UnknownPrefix { vds: String, segment: String },

    #[error("unknown bore type {bore:?} in {vds}")]
    UnknownBore { vds: String, bore: char },

    #[error("unknown piping class {segment:?} in {vds}")]
    UnknownClass { vds: String, segment: String },

    #[error("unknown modifier {modifier:?} in {vds}")]
    UnknownModifier { vds: String, modifier: char },

    #[error("unknown end connection {end:?} in {vds}")]
    UnknownEndConnection { vds: String, end: char },

    #[error("VDS number {vds:?} is too short")]
    Truncated { vds: String },
}

impl DecodeError {
    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::UnknownPrefix { .. } => "UnknownPrefix",
            DecodeError::UnknownBore { .. } => "UnknownBore",
            DecodeError::UnknownClass { .. } => "UnknownClass",
            DecodeError::UnknownModifier { .. } => "UnknownModifier",
            DecodeError::UnknownEndConnection { .. } => "UnknownEndConnection",
            DecodeError::Truncated { .. } => "TruncatedVDS",
        }
    }

    /// The segment of the input that failed to parse
    pub fn segment(&self) -> String {
        match self {
            DecodeError::UnknownPrefix { segment, .. }
            | DecodeError::UnknownClass { segment, .. } => segment.clone(),
            DecodeError::UnknownBore { bore, .. } => bore.to_string(),
            DecodeError::UnknownModifier { modifier, .. } => modifier.to_string(),
            DecodeError::UnknownEndConnection { end, .. } => end.to_string(),
            DecodeError::Truncated { vds } => vds.clone(),
        }
    }
}

/// Greedy left-to-right parser over the configured grammar.
///
/// Input is uppercased after stripping trailing whitespace; leading or
/// embedded whitespace fails segment matching and is rejected that way.
#[derive(Debug, Clone)]
pub struct VdsDecoder {
    rules: VdsRules,
    class_regex: Regex,
}

impl VdsDecoder {
    pub fn new(config: &Config) -> Self {
        Self {
            rules: config.rules.clone(),
            class_regex: config.class_regex.clone(),
        }
    }

    /// Parse a VDS number, confirming the piping class exists.
    ///
    /// The piping repository is consulted only for that existence check.
    pub fn decode(&self, input: &str, pms: &PmsRepository) -> Result<DecodedVds, DecodeError> {
        let vds = input.trim_end().to_uppercase();
        if vds.is_empty() {
            return Err(DecodeError::Truncated { vds });
        }

        let prefix = self
            .rules
            .prefixes_longest_first()
            .into_iter()
            .find(|p| vds.starts_with(*p))
            .map(str::to_string)
            .ok_or_else(|| DecodeError::UnknownPrefix {
                vds: vds.clone(),
                segment: vds.chars().take(3).collect(),
            })?;
        let prefix_def = &self.rules.valve_type_prefixes[&prefix];

        // Shortest possible remainder: bore, class letter, class digit,
        // end connection.
        let rest: Vec<char> = vds[prefix.len()..].chars().collect();
        if rest.len() < 4 {
            return Err(DecodeError::Truncated { vds });
        }

        let bore = rest[0];
        let bore_name = self
            .rules
            .bore_name(bore)
            .ok_or(DecodeError::UnknownBore {
                vds: vds.clone(),
                bore,
            })?
            .to_string();

        let mut idx = 1;
        let mut is_metal_seated = bore == 'M';
        if prefix_def.metal_seated_flag && bore != 'M' && rest.get(idx) == Some(&'M') {
            is_metal_seated = true;
            idx += 1;
        }

        let tail: String = rest[idx..].iter().collect();
        let class_match =
            self.class_regex
                .find(&tail)
                .ok_or_else(|| DecodeError::UnknownClass {
                    vds: vds.clone(),
                    segment: tail.clone(),
                })?;
        let piping_class = class_match.as_str().to_string();
        if !pms.contains(&piping_class) {
            return Err(DecodeError::UnknownClass {
                vds: vds.clone(),
                segment: piping_class,
            });
        }

        let after_class = &tail[class_match.end()..];
        let mut between: Vec<char> = after_class.chars().collect();
        let Some(end_code) = between.pop() else {
            return Err(DecodeError::Truncated { vds });
        };
        let end_def =
            self.rules
                .end_connection(end_code)
                .ok_or(DecodeError::UnknownEndConnection {
                    vds: vds.clone(),
                    end: end_code,
                })?;
        let end_connection_name = end_def.name.clone();

        let mut is_nace_compliant = false;
        let mut is_low_temp = false;
        for modifier in between {
            match self.rules.modifier(modifier) {
                Some(ModifierFlag::Nace) => is_nace_compliant = true,
                Some(ModifierFlag::LowTemp) => is_low_temp = true,
                None => {
                    return Err(DecodeError::UnknownModifier {
                        vds: vds.clone(),
                        modifier,
                    })
                }
            }
        }

        Ok(DecodedVds {
            raw: vds,
            valve_type_prefix: prefix,
            valve_type_name: prefix_def.name.clone(),
            bore_type: bore,
            bore_name,
            piping_class,
            is_nace_compliant,
            is_low_temp,
            is_metal_seated,
            end_connection: end_code,
            end_connection_name,
            primary_standard: prefix_def.primary_standard.clone(),
        })
    }

    /// Non-throwing validation wrapper
    pub fn validate(&self, input: &str, pms: &PmsRepository) -> Result<(), DecodeError> {
        self.decode(input, pms).map(|_| ())
    }

    pub fn rules(&self) -> &VdsRules {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PipingClass;

    fn pms() -> PmsRepository {
        let classes = ["A1", "B1", "D1", "G1"]
            .iter()
            .map(|c| PipingClass {
                class: c.to_string(),
                ..Default::default()
            })
            .collect();
        PmsRepository::from_classes(classes)
    }

    fn decoder() -> VdsDecoder {
        VdsDecoder::new(&Config::embedded().unwrap())
    }

    #[test]
    fn test_decode_plain_ball_valve() {
        let vds = decoder().decode("BSFA1R", &pms()).unwrap();
        assert_eq!(vds.raw, "BSFA1R");
        assert_eq!(vds.valve_type_prefix, "BS");
        assert_eq!(vds.valve_type(), "Ball Valve, Full Bore");
        assert_eq!(vds.piping_class, "A1");
        assert_eq!(vds.end_connection_name, "RF");
        assert!(!vds.is_nace_compliant);
        assert!(!vds.is_low_temp);
        assert!(!vds.is_metal_seated);
        assert_eq!(vds.primary_standard, "API 6D / ISO 17292");
    }

    #[test]
    fn test_decode_nace_modifier() {
        let vds = decoder().decode("BSFB1NR", &pms()).unwrap();
        assert_eq!(vds.piping_class, "B1");
        assert!(vds.is_nace_compliant);
        assert!(!vds.is_low_temp);
    }

    #[test]
    fn test_decode_gate_valve_butt_weld() {
        let vds = decoder().decode("GSRD1W", &pms()).unwrap();
        assert_eq!(vds.valve_type(), "Gate Valve, Reduced Bore");
        assert_eq!(vds.end_connection_name, "BW");
        assert_eq!(vds.primary_standard, "API 6D / API 600");
    }

    #[test]
    fn test_decode_metal_seated_flag_with_both_modifiers() {
        let vds = decoder().decode("BSFMG1LNJ", &pms()).unwrap();
        assert_eq!(vds.bore_type, 'F');
        assert!(vds.is_metal_seated);
        assert!(vds.is_low_temp);
        assert!(vds.is_nace_compliant);
        assert_eq!(vds.piping_class, "G1");
        assert_eq!(vds.end_connection_name, "RTJ");
        assert_eq!(vds.reconstruct(), "BSFMG1LNJ");
    }

    #[test]
    fn test_decode_metal_seated_bore_consumes_no_flag() {
        let vds = decoder().decode("BSMG1LNJ", &pms()).unwrap();
        assert_eq!(vds.bore_type, 'M');
        assert_eq!(vds.bore_name, "Full Bore");
        assert!(vds.is_metal_seated);
        assert_eq!(vds.reconstruct(), "BSMG1LNJ");
    }

    #[test]
    fn test_lowercase_and_trailing_whitespace_normalized() {
        let vds = decoder().decode("bsfa1r  \n", &pms()).unwrap();
        assert_eq!(vds.raw, "BSFA1R");
    }

    #[test]
    fn test_leading_whitespace_rejected() {
        assert!(matches!(
            decoder().decode(" BSFA1R", &pms()),
            Err(DecodeError::UnknownPrefix { .. })
        ));
    }

    #[test]
    fn test_embedded_whitespace_rejected() {
        assert!(matches!(
            decoder().decode("BSF A1R", &pms()),
            Err(DecodeError::UnknownClass { .. })
        ));
    }

    #[test]
    fn test_unknown_prefix() {
        let err = decoder().decode("XYZA1R", &pms()).unwrap_err();
        assert_eq!(err.kind(), "UnknownPrefix");
        assert_eq!(err.segment(), "XYZ");
    }

    #[test]
    fn test_unknown_bore() {
        assert!(matches!(
            decoder().decode("BSXA1R", &pms()),
            Err(DecodeError::UnknownBore { bore: 'X', .. })
        ));
    }

    #[test]
    fn test_class_missing_from_repository() {
        let err = decoder().decode("BSFE1R", &pms()).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownClass { .. }));
        assert_eq!(err.segment(), "E1");
    }

    #[test]
    fn test_unknown_modifier() {
        assert!(matches!(
            decoder().decode("BSFA1XR", &pms()),
            Err(DecodeError::UnknownModifier { modifier: 'X', .. })
        ));
    }

    #[test]
    fn test_unknown_end_connection() {
        assert!(matches!(
            decoder().decode("BSFA1Q", &pms()),
            Err(DecodeError::UnknownEndConnection { end: 'Q', .. })
        ));
    }

    #[test]
    fn test_truncated_input() {
        let err = decoder().decode("BSF", &pms()).unwrap_err();
        assert_eq!(err.kind(), "TruncatedVDS");
        // Class digits present but no end connection left.
        assert!(matches!(
            decoder().decode("BSFA1", &pms()),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_minimum_length_vds() {
        let vds = decoder().decode("BSFA1R", &pms()).unwrap();
        assert_eq!(vds.raw.len(), 6);
    }

    #[test]
    fn test_decode_is_idempotent_on_raw() {
        let d = decoder();
        let once = d.decode("bsfb1nr", &pms()).unwrap();
        let twice = d.decode(&once.raw, &pms()).unwrap();
        assert_eq!(once, twice);
    }
}
