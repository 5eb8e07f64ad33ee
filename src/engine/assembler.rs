//! Datasheet assembly and validation

use chrono::Utc;

use crate::config::Config;
use crate::engine::resolver::ResolveError;
use crate::model::{
    Completion, Datasheet, DatasheetMetadata, DecodedVds, ResolvedField, Section, ValidationStatus,
};

/// Composes resolved fields into the final datasheet and runs the
/// completeness and consistency checks
pub struct Assembler<'a> {
    config: &'a Config,
}

impl<'a> Assembler<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Build the datasheet from fields resolved in schema order.
    ///
    /// `resolved` must hold one entry per schema field, in schema order;
    /// the resolver guarantees this by construction.
    pub fn assemble(
        &self,
        vds: &DecodedVds,
        resolved: Vec<(ResolvedField, Option<ResolveError>)>,
    ) -> Datasheet {
        let mut validation_errors = Vec::new();
        let mut warnings = Vec::new();

        for (field, error) in &resolved {
            match error {
                Some(err) if field.is_required => {
                    validation_errors.push(format!("{}: {err}", field.field_name));
                }
                Some(err) => {
                    warnings.push(format!("{}: {err}", field.field_name));
                }
                None if field.is_required && !field.is_populated() => {
                    validation_errors
                        .push(format!("{}: required field not populated", field.field_name));
                }
                None => {}
            }
        }

        let fields: Vec<ResolvedField> = resolved.into_iter().map(|(f, _)| f).collect();

        let sections = self
            .config
            .schema
            .sections
            .iter()
            .map(|section_def| Section {
                name: section_def.name.clone(),
                fields: fields
                    .iter()
                    .filter(|f| f.section == section_def.name)
                    .cloned()
                    .collect(),
            })
            .collect::<Vec<_>>();

        self.cross_check(&sections, &mut warnings);

        let total = self.config.schema.field_count();
        let populated = sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .filter(|f| f.is_populated())
            .count();
        let percentage = if total == 0 {
            0.0
        } else {
            (populated as f64 / total as f64 * 1000.0).round() / 10.0
        };

        let validation_status = if !validation_errors.is_empty() {
            ValidationStatus::Invalid
        } else if !warnings.is_empty() {
            ValidationStatus::Warnings
        } else {
            ValidationStatus::Valid
        };

        Datasheet {
            metadata: DatasheetMetadata {
                generated_at: Utc::now(),
                generation_version: env!("CARGO_PKG_VERSION").to_string(),
                vds_no: vds.raw.clone(),
                completion: Completion {
                    populated,
                    total,
                    percentage,
                },
                validation_status,
                validation_errors,
                warnings,
            },
            sections,
        }
    }

    /// Configured pressure-class / design-pressure consistency checks.
    ///
    /// The design pressure must not exceed the configured ceiling for the
    /// ASME class named by the pressure-class field.
    fn cross_check(&self, sections: &[Section], warnings: &mut Vec<String>) {
        let field_value = |name: &str| -> Option<String> {
            sections
                .iter()
                .flat_map(|s| s.fields.iter())
                .find(|f| f.field_name == name)
                .and_then(|f| f.value.clone())
        };

        for check in &self.config.schema.consistency.checks {
            let Some(class_value) = field_value(&check.pressure_class_field) else {
                continue;
            };
            let Some(pressure_value) = field_value(&check.design_pressure_field) else {
                continue;
            };

            let Some(class_numeric) = trailing_number(&class_value) else {
                continue;
            };
            let Some(pressure) = leading_number(&pressure_value) else {
                continue;
            };
            let Some(ceiling) = self.config.schema.rating_ceiling(class_numeric) else {
                continue;
            };

            if pressure > ceiling + 1e-9 {
                warnings.push(format!(
                    "{}: design pressure {pressure} barg exceeds Class {class_numeric} ceiling {ceiling} barg",
                    check.design_pressure_field
                ));
            }
        }
    }
}

/// Last whitespace-separated token parsed as an integer
/// (e.g. "ASME B16.34 Class 300" -> 300)
fn trailing_number(s: &str) -> Option<u32> {
    s.split_whitespace().next_back()?.parse().ok()
}

/// First whitespace-separated token parsed as a float
/// (e.g. "19.6 barg @ 38°C" -> 19.6)
fn leading_number(s: &str) -> Option<f64> {
    s.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_number() {
        assert_eq!(trailing_number("ASME B16.34 Class 300"), Some(300));
        assert_eq!(trailing_number("no digits"), None);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("19.6 barg @ 38°C"), Some(19.6));
        assert_eq!(leading_number("barg"), None);
    }
}
