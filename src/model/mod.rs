//! Model module - value types flowing through the engine

pub mod clause;
pub mod datasheet;
pub mod pms;
pub mod vds;

pub use clause::{RuleType, StandardClause};
pub use datasheet::{
    Completion, Datasheet, DatasheetMetadata, FieldStatus, FlatView, ResolvedField, Section,
    SourceKind, Traceability, ValidationStatus,
};
pub use pms::PipingClass;
pub use vds::DecodedVds;
