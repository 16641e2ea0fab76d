//! # jobprep-ml: validation, feature engineering and regression for job postings
//!
//! The crate implements the pipeline stages behind the `jobprep` binary:
//!
//! 1. **Validation**: column conformance against a schema, per-field content
//!    checks, de-duplication, and the gate status the next stage reads.
//! 2. **Transformation**: date/time decomposition, persisted categorical
//!    encoders, skill one-hot encoding, incomplete-row removal and a seeded
//!    train/test split.
//! 3. **Training & evaluation**: a standardized ElasticNet regressor and its
//!    regression metrics.

// Data engineering
pub mod data;
pub mod features;

// Stage orchestration
pub mod pipeline;

// Modeling
pub mod eval;
pub mod training;

pub mod error;

// Re-exports
pub use data::{Dataset, SchemaDefinition, ValidationReport, ValidationStatus, Validator};
pub use error::MlError;
pub use features::{CategoricalEncoder, FittedEncoders, SkillVocabulary};
pub use pipeline::{FeatureTransformer, GateStatus, Stage, TransformStage, run_pipeline};
