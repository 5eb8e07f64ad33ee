//! Per-field value resolution

use thiserror::Error;

use crate::config::{Config, FieldDef, Operand, PmsColumn, SourceRule, VdsAttribute};
use crate::engine::materials::select_material;
use crate::model::{DecodedVds, ResolvedField, SourceKind, Traceability};
use crate::repo::{PmsRepository, StandardsRepository, VdsIndexRepository};

/// A required upstream value is missing or unresolvable.
///
/// These never abort a generation: the assembler turns them into
/// validation errors or warnings depending on the field's required flag.
/// The Display form is user-visible and names the reason, never an
/// internal identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("MissingOperand ({detail})")]
    MissingOperand { detail: String },

    #[error("UnknownMaterial (key {key} not in material maps)")]
    UnknownMaterial { key: String },

    #[error("UnknownComponent (component {component} not defined for {key})")]
    UnknownComponent { component: String, key: String },

    #[error("MissingIndexRow (no VDS index row for {vds})")]
    MissingIndexRow { vds: String },
}

/// Resolves one schema field at a time against the repositories.
///
/// Holds only shared references; safe to use from any number of threads.
pub struct FieldResolver<'a> {
    config: &'a Config,
    pms: &'a PmsRepository,
    standards: &'a StandardsRepository,
    vds_index: &'a VdsIndexRepository,
}

impl<'a> FieldResolver<'a> {
    pub fn new(
        config: &'a Config,
        pms: &'a PmsRepository,
        standards: &'a StandardsRepository,
        vds_index: &'a VdsIndexRepository,
    ) -> Self {
        Self {
            config,
            pms,
            standards,
            vds_index,
        }
    }

    /// Resolve a field, always producing a ResolvedField.
    ///
    /// On a data error the field comes back unpopulated with the reason in
    /// its traceability notes, and the error is returned alongside for the
    /// assembler to classify.
    pub fn resolve(
        &self,
        def: &FieldDef,
        section: &str,
        vds: &DecodedVds,
    ) -> (ResolvedField, Option<ResolveError>) {
        match self.resolve_value(def, vds) {
            Ok((value, traceability)) => (
                ResolvedField {
                    field_name: def.name.clone(),
                    display_name: def.display_name.clone(),
                    section: section.to_string(),
                    value,
                    is_required: def.required,
                    traceability,
                },
                None,
            ),
            Err(err) => {
                let mut traceability = Traceability::new(source_kind_of(&def.rule));
                traceability.notes = Some(err.to_string());
                (
                    ResolvedField {
                        field_name: def.name.clone(),
                        display_name: def.display_name.clone(),
                        section: section.to_string(),
                        value: None,
                        is_required: def.required,
                        traceability,
                    },
                    Some(err),
                )
            }
        }
    }

    fn resolve_value(
        &self,
        def: &FieldDef,
        vds: &DecodedVds,
    ) -> Result<(Option<String>, Traceability), ResolveError> {
        match &def.rule {
            SourceRule::Vds {
                attribute,
                when_nace,
                otherwise,
            } => Ok(self.resolve_vds(*attribute, when_nace.as_deref(), otherwise.as_deref(), vds)),

            SourceRule::Pms { column } => Ok(self.resolve_pms(*column, vds)),

            SourceRule::Standard {
                fallback,
                when_metal_seated,
            } => Ok(self.resolve_standard(&def.name, fallback, when_metal_seated.as_deref(), vds)),

            SourceRule::PmsAndStandard { component } => self.resolve_material(component, vds),

            SourceRule::VdsIndex { column } => self.resolve_index(column, vds),

            SourceRule::Calculated {
                operand,
                factor,
                unit,
                reference,
            } => self.resolve_calculated(*operand, *factor, unit, reference.as_deref(), vds),

            SourceRule::Fixed { value } => {
                let mut trace = Traceability::new(SourceKind::Fixed);
                trace.source_document = Some("Field Mappings".to_string());
                trace.source_value = Some(value.clone());
                Ok((Some(value.clone()), trace))
            }
        }
    }

    fn resolve_vds(
        &self,
        attribute: VdsAttribute,
        when_nace: Option<&str>,
        otherwise: Option<&str>,
        vds: &DecodedVds,
    ) -> (Option<String>, Traceability) {
        let mut trace = Traceability::new(SourceKind::Vds);
        trace.source_document = Some(format!("VDS No: {}", vds.raw));

        let value = match attribute {
            VdsAttribute::VdsNo => Some(vds.raw.clone()),
            VdsAttribute::PipingClass => Some(vds.piping_class.clone()),
            VdsAttribute::ValveType => Some(vds.valve_type()),
            VdsAttribute::PrimaryStandard => Some(vds.primary_standard.clone()),
            VdsAttribute::EndConnections => {
                let description = self
                    .config
                    .rules
                    .end_connection(vds.end_connection)
                    .map(|e| e.description.clone())
                    .unwrap_or_else(|| vds.end_connection_name.clone());
                trace.derivation_rule =
                    Some("End-connection code mapped through grammar dictionary".to_string());
                Some(description)
            }
            VdsAttribute::SourService => {
                trace.derivation_rule = Some("Conditional on NACE modifier".to_string());
                if vds.is_nace_compliant {
                    when_nace.map(str::to_string)
                } else {
                    otherwise.map(str::to_string)
                }
            }
        };

        trace.source_value.clone_from(&value);
        (value, trace)
    }

    fn resolve_pms(&self, column: PmsColumn, vds: &DecodedVds) -> (Option<String>, Traceability) {
        let mut trace = Traceability::new(SourceKind::Pms);

        let Some(row) = self.pms.class_for(&vds.piping_class) else {
            trace.source_document = Some(format!("PMS Class {}", vds.piping_class));
            trace.notes = Some("piping class not found in PMS".to_string());
            return (None, trace);
        };

        trace.source_document = Some(if row.pressure_rating.is_empty() {
            format!("PMS Class {}", row.class)
        } else {
            format!("PMS Class {} ({})", row.class, row.pressure_rating)
        });

        let value = match column {
            PmsColumn::Service => non_empty(&row.service),
            PmsColumn::CorrosionAllowance => non_empty(&row.corrosion_allowance),
            PmsColumn::DesignPressure => non_empty(&row.design_pressure_max),
            PmsColumn::PressureClass => {
                let numeric = row.pressure_class_numeric().or_else(|| {
                    let letter = row.class.chars().next()?;
                    trace.derivation_rule =
                        Some(format!("Class derived from piping class letter {letter}"));
                    self.config.schema.class_for_letter(letter)
                });
                if trace.derivation_rule.is_none() {
                    trace.derivation_rule = Some(format!(
                        "Class number from PMS rating {}",
                        row.pressure_rating
                    ));
                }
                numeric.map(|n| format!("ASME B16.34 Class {n}"))
            }
        };

        trace.source_value.clone_from(&value);
        (value, trace)
    }

    fn resolve_standard(
        &self,
        field_name: &str,
        fallback: &str,
        when_metal_seated: Option<&str>,
        vds: &DecodedVds,
    ) -> (Option<String>, Traceability) {
        let mut trace = Traceability::new(SourceKind::Standard);

        if let Some(clause) = self
            .standards
            .value_for_field(field_name, &vds.valve_type_name)
        {
            trace.source_document = Some(clause.standard.clone());
            trace.clause_reference = Some(clause.full_reference());
            trace.source_value = Some(clause.text.clone());
            let value = non_empty(&clause.text).unwrap_or_else(|| clause.full_reference());
            return (Some(value), trace);
        }

        trace.source_document = Some("Field Mappings".to_string());
        let value = match when_metal_seated {
            Some(metal) if vds.is_metal_seated => {
                trace.derivation_rule = Some("Metal-seated construction".to_string());
                metal.to_string()
            }
            _ => fallback.to_string(),
        };
        trace.source_value = Some(value.clone());
        (Some(value), trace)
    }

    fn resolve_material(
        &self,
        component: &str,
        vds: &DecodedVds,
    ) -> Result<(Option<String>, Traceability), ResolveError> {
        let base_material = self
            .pms
            .class_for(&vds.piping_class)
            .map(|row| row.base_material.clone())
            .unwrap_or_default();

        let size = self
            .vds_index
            .row_for(&vds.raw)
            .and_then(|row| row.representative_size());

        let selection =
            select_material(&self.config.materials, &base_material, vds, component, size)?;

        let mut trace = Traceability::new(SourceKind::PmsAndStandard);
        trace.source_document = Some(format!("Material Mappings ({})", selection.key));
        trace.derivation_rule = Some(format!(
            "Material lookup: base={}, nace={}, low_temp={}",
            if base_material.trim().is_empty() {
                "CS"
            } else {
                base_material.trim()
            },
            vds.is_nace_compliant,
            vds.is_low_temp
        ));
        trace.source_value = Some(selection.value.clone());

        let mut notes = vec![format!("component {component}")];
        if let Some(branch) = &selection.branch {
            notes.push(branch.clone());
        }
        if selection.key != selection.requested_key {
            notes.push(format!(
                "requested key {}, resolved {}",
                selection.requested_key, selection.key
            ));
        }
        trace.notes = Some(notes.join("; "));

        Ok((Some(selection.value), trace))
    }

    fn resolve_index(
        &self,
        column: &str,
        vds: &DecodedVds,
    ) -> Result<(Option<String>, Traceability), ResolveError> {
        let row = self
            .vds_index
            .row_for(&vds.raw)
            .ok_or_else(|| ResolveError::MissingIndexRow {
                vds: vds.raw.clone(),
            })?;

        let mut trace = Traceability::new(SourceKind::VdsIndex);
        trace.source_document = Some(format!("VDS Index: {}", vds.raw));

        match row.get(column) {
            Some(value) => {
                trace.source_value = Some(value.clone());
                Ok((Some(value), trace))
            }
            None => {
                trace.notes = Some(format!("column {column} absent from index row"));
                Ok((None, trace))
            }
        }
    }

    fn resolve_calculated(
        &self,
        operand: Operand,
        factor: f64,
        unit: &str,
        reference: Option<&str>,
        vds: &DecodedVds,
    ) -> Result<(Option<String>, Traceability), ResolveError> {
        let pressure = match operand {
            Operand::DesignPressureMax => self
                .pms
                .class_for(&vds.piping_class)
                .and_then(|row| row.design_pressure_max_barg())
                .ok_or_else(|| ResolveError::MissingOperand {
                    detail: format!(
                        "no numeric design pressure for class {}",
                        vds.piping_class
                    ),
                })?,
        };

        let mut trace = Traceability::new(SourceKind::Calculated);
        trace.source_document = Some(format!("PMS Class {}", vds.piping_class));
        trace.source_value = Some(format!("{pressure} {unit}"));
        trace.derivation_rule = Some(match reference {
            Some(reference) => format!("{factor} x Max Design Pressure ({reference})"),
            None => format!("{factor} x Max Design Pressure"),
        });

        let value = format!("{:.1} {unit}", pressure * factor);
        Ok((Some(value), trace))
    }
}

/// The source kind a rule variant reports in traceability
pub fn source_kind_of(rule: &SourceRule) -> SourceKind {
    match rule {
        SourceRule::Vds { .. } => SourceKind::Vds,
        SourceRule::Pms { .. } => SourceKind::Pms,
        SourceRule::Standard { .. } => SourceKind::Standard,
        SourceRule::PmsAndStandard { .. } => SourceKind::PmsAndStandard,
        SourceRule::VdsIndex { .. } => SourceKind::VdsIndex,
        SourceRule::Calculated { .. } => SourceKind::Calculated,
        SourceRule::Fixed { .. } => SourceKind::Fixed,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::embedded::read_default;
    use crate::engine::decoder::VdsDecoder;

    struct Fixture {
        config: Config,
        pms: PmsRepository,
        standards: StandardsRepository,
        vds_index: VdsIndexRepository,
    }

    impl Fixture {
        fn new() -> Self {
            let config = Config::embedded().unwrap();
            let pms = PmsRepository::from_json_str(
                &read_default("piping_spec.json").unwrap(),
                "piping_spec.json",
            )
            .unwrap();
            let standards = StandardsRepository::from_json_str(
                &read_default("clauses.json").unwrap(),
                "clauses.json",
            )
            .unwrap();
            let vds_index = VdsIndexRepository::from_json_str(
                &read_default("vds_index.json").unwrap(),
                "vds_index.json",
            )
            .unwrap();
            Self {
                config,
                pms,
                standards,
                vds_index,
            }
        }

        fn resolver(&self) -> FieldResolver<'_> {
            FieldResolver::new(&self.config, &self.pms, &self.standards, &self.vds_index)
        }

        fn decode(&self, vds: &str) -> DecodedVds {
            VdsDecoder::new(&self.config)
                .decode(vds, &self.pms)
                .unwrap()
        }

        fn def(&self, name: &str) -> (&FieldDef, &str) {
            for section in &self.config.schema.sections {
                for field in &section.fields {
                    if field.name == name {
                        return (field, &section.name);
                    }
                }
            }
            panic!("no field {name} in schema");
        }
    }

    fn resolve(fix: &Fixture, field: &str, vds: &str) -> (ResolvedField, Option<ResolveError>) {
        let decoded = fix.decode(vds);
        let (def, section) = fix.def(field);
        fix.resolver().resolve(def, section, &decoded)
    }

    #[test]
    fn test_pressure_class_from_rating() {
        let fix = Fixture::new();
        let (field, err) = resolve(&fix, "pressure_class", "BSFA1R");
        assert_eq!(err, None);
        assert_eq!(field.value.as_deref(), Some("ASME B16.34 Class 150"));
        assert_eq!(
            field.traceability.source_document.as_deref(),
            Some("PMS Class A1 (150#)")
        );
    }

    #[test]
    fn test_design_pressure_verbatim() {
        let fix = Fixture::new();
        let (field, _) = resolve(&fix, "design_pressure", "BSFA1R");
        assert_eq!(field.value.as_deref(), Some("19.6 barg @ 38°C"));
    }

    #[test]
    fn test_sour_service_conditional_table() {
        let fix = Fixture::new();
        let (plain, _) = resolve(&fix, "sour_service", "BSFA1R");
        assert_eq!(plain.value.as_deref(), Some("-"));
        let (sour, _) = resolve(&fix, "sour_service", "BSFB1NR");
        assert_eq!(sour.value.as_deref(), Some("NACE MR0175 / ISO 15156"));
    }

    #[test]
    fn test_end_connections_mapped_through_dictionary() {
        let fix = Fixture::new();
        let (field, _) = resolve(&fix, "end_connections", "GSRD1W");
        assert_eq!(field.value.as_deref(), Some("Butt Weld ASME B16.25"));
    }

    #[test]
    fn test_standard_field_uses_mandatory_clause() {
        let fix = Fixture::new();
        let (field, _) = resolve(&fix, "inspection_testing", "BSFA1R");
        assert_eq!(field.value.as_deref(), Some("API 598"));
        assert_eq!(
            field.traceability.clause_reference.as_deref(),
            Some("API 598 4.1")
        );
    }

    #[test]
    fn test_standard_field_falls_back_without_clause() {
        let fix = Fixture::new();
        let (field, _) = resolve(&fix, "fire_rating", "BSFA1R");
        assert_eq!(field.value.as_deref(), Some("API 607 / API 6FA"));
        assert_eq!(field.traceability.clause_reference, None);
    }

    #[test]
    fn test_seat_construction_metal_seated_branch() {
        let fix = Fixture::new();
        let (soft, _) = resolve(&fix, "seat_construction", "BSFA1R");
        assert_eq!(soft.value.as_deref(), Some("Soft Seated, Renewable"));
        let (metal, _) = resolve(&fix, "seat_construction", "BSFMG1LNJ");
        assert_eq!(
            metal.value.as_deref(),
            Some("Metal Seated, Hard Faced, Renewable")
        );
    }

    #[test]
    fn test_hydrotest_formula_and_trace() {
        let fix = Fixture::new();
        let (shell, err) = resolve(&fix, "hydrotest_shell", "BSFA1R");
        assert_eq!(err, None);
        assert_eq!(shell.value.as_deref(), Some("29.4 barg"));
        assert_eq!(
            shell.traceability.derivation_rule.as_deref(),
            Some("1.5 x Max Design Pressure (API 598)")
        );

        let (closure, _) = resolve(&fix, "hydrotest_closure", "BSFA1R");
        assert_eq!(closure.value.as_deref(), Some("21.6 barg"));
    }

    #[test]
    fn test_missing_operand_for_class_without_pressure() {
        let fix = Fixture::new();
        let (field, err) = resolve(&fix, "hydrotest_shell", "BSFC1R");
        assert!(field.value.is_none());
        assert!(matches!(err, Some(ResolveError::MissingOperand { .. })));
    }

    #[test]
    fn test_index_field_missing_row() {
        let fix = Fixture::new();
        let (field, err) = resolve(&fix, "size_range", "BSFE1R");
        assert!(field.value.is_none());
        assert!(matches!(err, Some(ResolveError::MissingIndexRow { .. })));
    }

    #[test]
    fn test_material_field_traceability() {
        let fix = Fixture::new();
        let (bolts, err) = resolve(&fix, "bolts", "BSFB1NR");
        assert_eq!(err, None);
        assert_eq!(bolts.value.as_deref(), Some("ASTM A193 Gr. B7M"));
        assert_eq!(
            bolts.traceability.source_document.as_deref(),
            Some("Material Mappings (CS_NACE)")
        );
        assert_eq!(
            bolts.traceability.derivation_rule.as_deref(),
            Some("Material lookup: base=CS, nace=true, low_temp=false")
        );
        assert_eq!(bolts.traceability.confidence, 1.0);
    }

    #[test]
    fn test_pressure_class_derived_from_letter_when_rating_blank() {
        let mut fix = Fixture::new();
        fix.pms = PmsRepository::from_classes(vec![crate::model::PipingClass {
            class: "D1".to_string(),
            base_material: "CS".to_string(),
            ..Default::default()
        }]);

        let decoded = fix.decode("GSRD1W");
        let (def, section) = fix.def("pressure_class");
        let (field, _) = fix.resolver().resolve(def, section, &decoded);

        assert_eq!(field.value.as_deref(), Some("ASME B16.34 Class 600"));
        assert!(field
            .traceability
            .derivation_rule
            .as_deref()
            .is_some_and(|d| d.contains("letter D")));
    }

    #[test]
    fn test_fixed_field() {
        let fix = Fixture::new();
        let (field, _) = resolve(&fix, "pneumatic_test", "BSFA1R");
        assert_eq!(field.value.as_deref(), Some("5.5 barg"));
        assert_eq!(field.traceability.source_kind, SourceKind::Fixed);
    }
}
