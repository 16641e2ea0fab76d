//! Records of feature-transformation steps.

use chrono::{DateTime, Utc};
use jobprep_core::DropPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of the feature transformation sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformStep {
    DecomposeDatetime {
        field: String,
    },
    EncodeCategorical {
        fields: Vec<String>,
    },
    OneHotQualifications {
        field: String,
        vocabulary_size: usize,
    },
    DropIncompleteRows {
        policy: DropPolicy,
    },
    Split {
        train_fraction: f64,
        seed: u64,
    },
    Export {
        path: String,
    },
}

impl fmt::Display for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DecomposeDatetime { field } => write!(f, "decompose_datetime({field})"),
            Self::EncodeCategorical { fields } => {
                write!(f, "encode_categorical({})", fields.join(", "))
            }
            Self::OneHotQualifications { field, .. } => write!(f, "one_hot_qualifications({field})"),
            Self::DropIncompleteRows { policy } => write!(f, "drop_incomplete_rows({policy:?})"),
            Self::Split {
                train_fraction,
                seed,
            } => write!(f, "split({train_fraction}, seed={seed})"),
            Self::Export { path } => write!(f, "export({path})"),
        }
    }
}

/// Record of a step applied (for lineage tracking).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRecord {
    pub step: TransformStep,
    pub applied_at: DateTime<Utc>,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_after: usize,
    /// Values that could not be parsed or encoded and became null/sentinel.
    #[serde(default)]
    pub coercion_failures: usize,
}

impl TransformRecord {
    pub fn new(step: TransformStep, rows_before: usize, rows_after: usize, columns_after: usize) -> Self {
        Self {
            step,
            applied_at: Utc::now(),
            rows_before,
            rows_after,
            columns_after,
            coercion_failures: 0,
        }
    }

    pub fn with_failures(mut self, coercion_failures: usize) -> Self {
        self.coercion_failures = coercion_failures;
        self
    }
}
