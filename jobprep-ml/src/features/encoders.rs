//! Persisted encoder artifact shared by fitting and inference.

use crate::data::dataset::Dataset;
use crate::error::MlError;
use crate::features::categorical::CategoricalEncoder;
use crate::features::skills::SkillVocabulary;
use chrono::{DateTime, Utc};
use jobprep_core::UnseenValuePolicy;
use jobprep_core::persistence::{atomic_write_json, load_json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

const ENCODERS_VERSION: u32 = 2;

/// Everything fitted on the training corpus that inference must reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedEncoders {
    pub version: u32,
    pub fitted_at: DateTime<Utc>,
    pub source_rows: usize,
    pub unseen_policy: UnseenValuePolicy,
    /// Columns of the untransformed dataset the encoders were fitted from.
    pub input_columns: Vec<String>,
    /// The one input column new data may omit.
    pub target_column: Option<String>,
    pub categorical: Vec<CategoricalEncoder>,
    pub qualifications_field: String,
    pub skills: SkillVocabulary,
}

impl FittedEncoders {
    /// Fit one categorical encoder per field and the skill vocabulary.
    pub fn fit(
        dataset: &Dataset,
        categorical_fields: &[String],
        qualifications_field: &str,
        unseen_policy: UnseenValuePolicy,
    ) -> Result<Self, MlError> {
        let categorical = categorical_fields
            .iter()
            .map(|field| CategoricalEncoder::fit(dataset, field))
            .collect::<Result<Vec<_>, _>>()?;
        let skills = SkillVocabulary::fit(dataset, qualifications_field)?;
        Ok(Self {
            version: ENCODERS_VERSION,
            fitted_at: Utc::now(),
            source_rows: dataset.row_count(),
            unseen_policy,
            input_columns: dataset.columns().to_vec(),
            target_column: None,
            categorical,
            qualifications_field: qualifications_field.to_string(),
            skills,
        })
    }

    /// Record the untransformed input layout and its target column.
    pub fn with_input_columns(mut self, columns: Vec<String>, target: Option<String>) -> Self {
        self.input_columns = columns;
        self.target_column = target;
        self
    }

    /// Check that `columns` matches the fitted input layout.
    ///
    /// Order is ignored; only the target column may be absent.
    pub fn check_input_columns(&self, columns: &[String]) -> Result<(), MlError> {
        let expected: BTreeSet<&str> = self.input_columns.iter().map(String::as_str).collect();
        let actual: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
        let missing: Vec<&str> = expected
            .difference(&actual)
            .copied()
            .filter(|c| self.target_column.as_deref() != Some(*c))
            .collect();
        let extra: Vec<&str> = actual.difference(&expected).copied().collect();
        if missing.is_empty() && extra.is_empty() {
            return Ok(());
        }
        let mut problems = Vec::new();
        if !missing.is_empty() {
            problems.push(format!("missing columns: {}", missing.join(", ")));
        }
        if !extra.is_empty() {
            problems.push(format!("unexpected columns: {}", extra.join(", ")));
        }
        Err(MlError::dataset(format!(
            "input does not match the fitted columns; {}",
            problems.join("; ")
        )))
    }

    pub fn encoder(&self, field: &str) -> Option<&CategoricalEncoder> {
        self.categorical.iter().find(|e| e.field == field)
    }

    pub fn save(&self, path: &Path) -> Result<(), MlError> {
        atomic_write_json(path, self)?;
        tracing::info!(
            path = %path.display(),
            encoders = self.categorical.len(),
            skills = self.skills.len(),
            "Saved fitted encoders"
        );
        Ok(())
    }

    /// Load and check a persisted artifact.
    pub fn load(path: &Path) -> Result<Self, MlError> {
        let encoders: Self = load_json(path)?
            .ok_or_else(|| MlError::not_found(format!("encoders {}", path.display())))?;
        if encoders.version != ENCODERS_VERSION {
            return Err(MlError::encoder(format!(
                "unsupported encoders version {} in {}",
                encoders.version,
                path.display()
            )));
        }
        if !encoders.skills.verify() {
            return Err(MlError::encoder(format!(
                "skill vocabulary fingerprint mismatch in {}",
                path.display()
            )));
        }
        Ok(encoders)
    }
}
