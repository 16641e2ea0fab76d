//! # jobprep-core
//!
//! Foundation shared by the jobprep crates: layered configuration, the
//! configuration error type, and atomic persistence helpers for artifacts.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{
    DataTransformationConfig, DataValidationConfig, DropPolicy, JobprepConfig,
    ModelEvaluationConfig, ModelTrainerConfig, UnseenValuePolicy,
};
pub use error::{ConfigError, Result};
