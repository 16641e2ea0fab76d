//! Data engineering: loading, validation, splitting and lineage.

pub mod dataset;
pub mod dates;
pub mod lineage;
pub mod literal;
pub mod schema;
pub mod source;
pub mod split;
pub mod transform;
pub mod validate;

pub use dataset::Dataset;
pub use lineage::DataLineage;
pub use schema::{ColumnType, SchemaDefinition};
pub use split::train_test_split;
pub use transform::{TransformRecord, TransformStep};
pub use validate::{FieldCheck, FieldReport, ValidationReport, ValidationStatus, Validator};
