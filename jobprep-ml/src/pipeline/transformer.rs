//! Feature transformation as a single-use, ordered state machine.
//!
//! Steps must run in order: decompose the date, encode categoricals, one-hot
//! the qualifications, drop incomplete rows, split. Each step checks the
//! current [`TransformStage`] and fails with [`MlError::PipelineState`] when
//! called out of turn. Encoders are fitted once, on the full dataset before
//! the split, so the train and test partitions share one code space.

use crate::data::dataset::Dataset;
use crate::data::lineage::DataLineage;
use crate::data::source;
use crate::data::split::train_test_split;
use crate::data::transform::{TransformRecord, TransformStep};
use crate::error::MlError;
use crate::features::datetime;
use crate::features::encoders::FittedEncoders;
use jobprep_core::DataTransformationConfig;
use jobprep_core::DropPolicy;
use jobprep_core::persistence::atomic_write_json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Position of a [`FeatureTransformer`] in its step sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformStage {
    Loaded,
    Decomposed,
    Encoded,
    OneHot,
    Cleaned,
    Split,
}

impl fmt::Display for TransformStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loaded => "loaded",
            Self::Decomposed => "decomposed",
            Self::Encoded => "encoded",
            Self::OneHot => "one_hot",
            Self::Cleaned => "cleaned",
            Self::Split => "split",
        };
        f.write_str(name)
    }
}

/// Applies the feature steps to one dataset.
pub struct FeatureTransformer {
    config: DataTransformationConfig,
    dataset: Dataset,
    stage: TransformStage,
    encoders: Option<FittedEncoders>,
    input_columns: Vec<String>,
    target_column: Option<String>,
    /// Null flags of columns removed before `drop_incomplete_rows` runs.
    dropped_nulls: HashMap<String, Vec<bool>>,
    lineage: DataLineage,
}

impl FeatureTransformer {
    /// Load the validated dataset named by `config.data_path`.
    pub fn load(config: DataTransformationConfig) -> Result<Self, MlError> {
        let dataset = source::read_csv(&config.data_path).inspect_err(|e| {
            tracing::error!(path = %config.data_path.display(), error = %e, "Error loading data");
        })?;
        tracing::info!(
            path = %config.data_path.display(),
            shape = ?dataset.shape(),
            "Data loaded"
        );
        Ok(Self::from_dataset(config, dataset))
    }

    pub fn from_dataset(config: DataTransformationConfig, dataset: Dataset) -> Self {
        let lineage = DataLineage::new(
            &uuid::Uuid::new_v4().to_string(),
            &config.data_path.display().to_string(),
            dataset.row_count(),
        );
        Self {
            config,
            input_columns: dataset.columns().to_vec(),
            dataset,
            stage: TransformStage::Loaded,
            encoders: None,
            target_column: None,
            dropped_nulls: HashMap::new(),
            lineage,
        }
    }

    /// Name the target column; fitted encoders record it as optional input.
    pub fn with_target_column(mut self, target: impl Into<String>) -> Self {
        self.target_column = Some(target.into());
        self
    }

    pub fn stage(&self) -> TransformStage {
        self.stage
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn encoders(&self) -> Option<&FittedEncoders> {
        self.encoders.as_ref()
    }

    pub fn lineage(&self) -> &DataLineage {
        &self.lineage
    }

    fn expect_stage(&self, expected: TransformStage) -> Result<(), MlError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(MlError::state(expected, self.stage))
        }
    }

    fn record(&mut self, step: TransformStep, rows_before: usize, failures: usize) {
        tracing::debug!(%step, shape = ?self.dataset.shape(), "Transform applied");
        let record = TransformRecord::new(
            step,
            rows_before,
            self.dataset.row_count(),
            self.dataset.column_count(),
        )
        .with_failures(failures);
        self.lineage.add_transform(record);
    }

    /// Append the six integer parts of `field`; unparsable values give nulls.
    pub fn decompose_datetime(&mut self, field: &str) -> Result<(), MlError> {
        self.expect_stage(TransformStage::Loaded)?;
        let rows = self.dataset.row_count();
        let summary = datetime::decompose_column(&mut self.dataset, field)?;
        self.record(
            TransformStep::DecomposeDatetime {
                field: field.to_string(),
            },
            rows,
            summary.coercion_failures,
        );
        self.stage = TransformStage::Decomposed;
        Ok(())
    }

    /// Replace each field with integer codes.
    ///
    /// Without prefitted encoders, the encoders (and the skill vocabulary)
    /// are fitted here on the whole dataset.
    pub fn encode_categorical(&mut self, fields: &[String]) -> Result<(), MlError> {
        self.expect_stage(TransformStage::Decomposed)?;
        if self.encoders.is_none() {
            let fitted = FittedEncoders::fit(
                &self.dataset,
                fields,
                &self.config.qualifications_field,
                self.config.unseen_policy,
            )?
            .with_input_columns(self.input_columns.clone(), self.target_column.clone());
            tracing::info!(
                fields = fields.len(),
                skills = fitted.skills.len(),
                "Fitted encoders"
            );
            self.encoders = Some(fitted);
        }
        let Some(encoders) = self.encoders.as_ref() else {
            return Err(MlError::encoder("encoders unavailable"));
        };

        let rows = self.dataset.row_count();
        let mut unseen = 0;
        for field in fields {
            let encoder = encoders
                .encoder(field)
                .ok_or_else(|| MlError::encoder(format!("no fitted encoder for '{field}'")))?;
            unseen += encoder.encode_column(&mut self.dataset, encoders.unseen_policy)?;
        }
        self.record(
            TransformStep::EncodeCategorical {
                fields: fields.to_vec(),
            },
            rows,
            unseen,
        );
        self.stage = TransformStage::Encoded;
        Ok(())
    }

    /// Replace the qualifications field with `qual_<token>` 0/1 columns.
    pub fn one_hot_qualifications(&mut self) -> Result<(), MlError> {
        self.expect_stage(TransformStage::Encoded)?;
        let Some(encoders) = self.encoders.as_ref() else {
            return Err(MlError::encoder("skill vocabulary unavailable"));
        };
        let field = encoders.qualifications_field.clone();

        let nulls: Vec<bool> = self
            .dataset
            .column(&field)
            .ok_or_else(|| MlError::dataset(format!("column '{field}' not found")))?
            .into_iter()
            .map(|v| v.is_null())
            .collect();

        let rows = self.dataset.row_count();
        let unseen = encoders.skills.one_hot(&mut self.dataset, &field)?;
        let vocabulary_size = encoders.skills.len();
        self.dropped_nulls.insert(field.clone(), nulls);
        self.record(
            TransformStep::OneHotQualifications {
                field,
                vocabulary_size,
            },
            rows,
            unseen,
        );
        self.stage = TransformStage::OneHot;
        Ok(())
    }

    /// Remove rows per the configured [`DropPolicy`]; returns rows removed.
    ///
    /// Fields already replaced by derived columns are judged by their
    /// original values.
    pub fn drop_incomplete_rows(&mut self) -> Result<usize, MlError> {
        self.expect_stage(TransformStage::OneHot)?;
        let policy = self.config.drop_policy;

        let (indices, masks): (Vec<usize>, Vec<&Vec<bool>>) = match policy {
            DropPolicy::AnyNull => (
                (0..self.dataset.column_count()).collect(),
                self.dropped_nulls.values().collect(),
            ),
            DropPolicy::RequiredFieldsOnly => {
                let mut indices = Vec::new();
                let mut masks = Vec::new();
                for field in &self.config.required_fields {
                    if let Some(idx) = self.dataset.column_index(field) {
                        indices.push(idx);
                    } else if let Some(mask) = self.dropped_nulls.get(field) {
                        masks.push(mask);
                    } else {
                        return Err(MlError::dataset(format!(
                            "required field '{field}' not found"
                        )));
                    }
                }
                (indices, masks)
            }
        };

        let drop: Vec<bool> = self
            .dataset
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                indices.iter().any(|&c| row[c].is_null()) || masks.iter().any(|m| m[i])
            })
            .collect();

        let rows = self.dataset.row_count();
        let removed = self.dataset.retain_rows(|i, _| !drop[i]);
        self.dropped_nulls.clear();
        tracing::info!(?policy, removed, remaining = self.dataset.row_count(), "Dropped incomplete rows");
        self.record(TransformStep::DropIncompleteRows { policy }, rows, 0);
        self.stage = TransformStage::Cleaned;
        Ok(removed)
    }

    /// Shuffle with `seed`, split, and write `train_data.csv` / `test_data.csv`.
    pub fn split(&mut self, train_fraction: f64, seed: u64) -> Result<(Dataset, Dataset), MlError> {
        self.expect_stage(TransformStage::Cleaned)?;
        let rows = self.dataset.row_count();
        let (train, test) = train_test_split(&self.dataset, train_fraction, seed)?;

        source::write_csv(&train, &self.config.train_data_path())?;
        source::write_csv(&test, &self.config.test_data_path())?;
        tracing::info!("Split data into training and test sets");
        tracing::info!(shape = ?train.shape(), "Train set");
        tracing::info!(shape = ?test.shape(), "Test set");

        self.record(
            TransformStep::Split {
                train_fraction,
                seed,
            },
            rows,
            0,
        );
        self.stage = TransformStage::Split;
        Ok((train, test))
    }

    /// Run every step with the configured settings and persist the encoders
    /// and lineage next to the split files.
    pub fn run(&mut self) -> Result<(Dataset, Dataset), MlError> {
        let date_field = self.config.date_field.clone();
        let categorical = self.config.categorical_fields.clone();

        self.decompose_datetime(&date_field)?;
        self.encode_categorical(&categorical)?;
        self.one_hot_qualifications()?;
        self.drop_incomplete_rows()?;
        let (train, test) = self.split(self.config.train_fraction, self.config.seed)?;

        if let Some(encoders) = &self.encoders {
            encoders.save(&self.config.encoders_file)?;
        }
        self.persist_lineage()?;
        Ok((train, test))
    }

    /// Transform with persisted encoders and write one features CSV to `output`.
    ///
    /// Nothing is refitted; the dataset is not split. The input must have
    /// the fitted column set, less the target at most.
    pub fn apply_fitted(
        &mut self,
        encoders: FittedEncoders,
        output: &Path,
    ) -> Result<&Dataset, MlError> {
        self.expect_stage(TransformStage::Loaded)?;
        encoders
            .check_input_columns(self.dataset.columns())
            .inspect_err(|e| tracing::error!(error = %e, "Rejected inference input"))?;
        let fields: Vec<String> = encoders
            .categorical
            .iter()
            .map(|e| e.field.clone())
            .collect();
        self.encoders = Some(encoders);

        let date_field = self.config.date_field.clone();
        self.decompose_datetime(&date_field)?;
        self.encode_categorical(&fields)?;
        self.one_hot_qualifications()?;
        self.drop_incomplete_rows()?;

        let rows = self.dataset.row_count();
        source::write_csv(&self.dataset, output)?;
        self.record(
            TransformStep::Export {
                path: output.display().to_string(),
            },
            rows,
            0,
        );
        self.stage = TransformStage::Split;
        self.persist_lineage()?;
        tracing::info!(path = %output.display(), shape = ?self.dataset.shape(), "Wrote features");
        Ok(&self.dataset)
    }

    fn persist_lineage(&self) -> Result<(), MlError> {
        atomic_write_json(&self.config.lineage_file, &self.lineage)?;
        tracing::debug!(path = %self.config.lineage_file.display(), "Saved lineage");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> DataTransformationConfig {
        let root = dir.path().join("data_transformation");
        DataTransformationConfig {
            data_path: dir.path().join("validated_data.csv"),
            encoders_file: root.join("encoders.json"),
            lineage_file: root.join("lineage.json"),
            root_dir: root,
            ..DataTransformationConfig::default()
        }
    }

    fn postings() -> Dataset {
        let columns = [
            "title",
            "company_name",
            "job_location",
            "job_type",
            "job_qualifications",
            "date_of_job_post",
            "salary",
        ]
        .map(String::from)
        .to_vec();
        let row = |title: &str, job_type: Value, quals: Value, date: &str, salary: f64| {
            vec![
                json!(title),
                json!("Acme"),
                json!("Berlin"),
                job_type,
                quals,
                json!(date),
                json!(salary),
            ]
        };
        Dataset::new(
            columns,
            vec![
                row("Data Engineer", json!("Remote"), json!("['Python', 'SQL']"), "2024-01-02 10:00:00", 70000.0),
                row("Analyst", json!("Onsite"), json!("['Excel']"), "2024-02-03 11:30:00", 50000.0),
                row("Analyst", Value::Null, json!("['SQL']"), "2024-03-04 09:15:00", 52000.0),
                row("ML Engineer", json!("Hybrid"), Value::Null, "2024-04-05 08:00:00", 90000.0),
                row("Data Engineer", json!("Remote"), json!("['python', 'Spark']"), "2024-05-06 12:45:30", 75000.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_stage_order_enforced() {
        let dir = TempDir::new().unwrap();
        let mut t = FeatureTransformer::from_dataset(config(&dir), postings());
        let err = t.one_hot_qualifications().unwrap_err();
        assert!(matches!(err, MlError::PipelineState { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid pipeline state: expected encoded, found loaded"
        );

        t.decompose_datetime("date_of_job_post").unwrap();
        assert!(t.decompose_datetime("date_of_job_post").is_err());
        assert_eq!(t.stage(), TransformStage::Decomposed);
    }

    #[test]
    fn test_full_run_writes_artifacts() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        let mut t = FeatureTransformer::from_dataset(cfg.clone(), postings());
        let (train, test) = t.run().unwrap();

        // Rows 2 (null job_type) and 3 (null qualifications) are dropped.
        assert_eq!(train.row_count() + test.row_count(), 3);
        assert_eq!(test.row_count(), 1);
        assert_eq!(t.stage(), TransformStage::Split);

        assert!(cfg.train_data_path().exists());
        assert!(cfg.test_data_path().exists());
        assert!(cfg.encoders_file.exists());
        assert!(cfg.lineage_file.exists());

        let columns = train.columns();
        assert!(!columns.iter().any(|c| c == "job_qualifications"));
        for expected in ["qual_excel", "qual_python", "qual_spark", "qual_sql", "year_of_job_post"] {
            assert!(columns.iter().any(|c| c == expected), "missing {expected}");
        }
        assert_eq!(t.lineage().transforms_applied.len(), 5);
        assert!(t.lineage().verify_integrity());
    }

    #[test]
    fn test_required_fields_policy_uses_original_qualifications() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.drop_policy = DropPolicy::RequiredFieldsOnly;
        cfg.required_fields = vec!["job_qualifications".into()];
        let mut t = FeatureTransformer::from_dataset(cfg, postings());
        t.decompose_datetime("date_of_job_post").unwrap();
        t.encode_categorical(&["job_type".into()]).unwrap();
        t.one_hot_qualifications().unwrap();
        assert_eq!(t.drop_incomplete_rows().unwrap(), 1);
        assert_eq!(t.dataset().row_count(), 4);
    }

    #[test]
    fn test_train_and_test_share_codes() {
        let dir = TempDir::new().unwrap();
        let mut t = FeatureTransformer::from_dataset(config(&dir), postings());
        t.run().unwrap();
        let encoder = t.encoders().unwrap().encoder("title").unwrap();
        assert_eq!(encoder.mapping["Analyst"], 0);
        assert_eq!(encoder.mapping["Data Engineer"], 1);
        assert_eq!(encoder.mapping["ML Engineer"], 2);
    }

    #[test]
    fn test_apply_fitted_reuses_vocabulary() {
        let dir = TempDir::new().unwrap();
        let mut fit =
            FeatureTransformer::from_dataset(config(&dir), postings()).with_target_column("salary");
        fit.run().unwrap();
        let encoders = fit.encoders().unwrap().clone();
        let vocabulary = encoders.skills.column_names();

        let fresh = Dataset::new(
            [
                "title",
                "company_name",
                "job_location",
                "job_type",
                "job_qualifications",
                "date_of_job_post",
            ]
            .map(String::from)
            .to_vec(),
            vec![vec![
                json!("Designer"),
                json!("Acme"),
                json!("Berlin"),
                json!("Remote"),
                json!("['Figma', 'SQL']"),
                json!("2024-06-01"),
            ]],
        )
        .unwrap();

        let output = dir.path().join("features.csv");
        let mut apply = FeatureTransformer::from_dataset(config(&dir), fresh);
        let features = apply.apply_fitted(encoders, &output).unwrap();

        assert_eq!(features.get(0, "title"), Some(&json!(-1)));
        assert_eq!(features.get(0, "qual_sql"), Some(&json!(1)));
        assert!(!features.has_column("qual_figma"));
        for name in &vocabulary {
            assert!(features.has_column(name));
        }
        assert!(output.exists());
    }

    #[test]
    fn test_apply_fitted_rejects_unexpected_columns() {
        let dir = TempDir::new().unwrap();
        let mut fit =
            FeatureTransformer::from_dataset(config(&dir), postings()).with_target_column("salary");
        fit.run().unwrap();
        let encoders = fit.encoders().unwrap().clone();
        assert!(encoders.input_columns.iter().any(|c| c == "salary"));
        assert_eq!(encoders.target_column.as_deref(), Some("salary"));

        let mut columns = postings().columns().to_vec();
        columns.push("recruiter_notes".into());
        let mut row: Vec<Value> = postings().rows()[0].clone();
        row.push(json!("call back later"));
        let extra = Dataset::new(columns, vec![row]).unwrap();

        let output = dir.path().join("features.csv");
        let mut apply = FeatureTransformer::from_dataset(config(&dir), extra);
        let err = apply.apply_fitted(encoders.clone(), &output).unwrap_err();
        assert!(matches!(err, MlError::Dataset(_)));
        assert!(err.to_string().contains("recruiter_notes"));
        assert_eq!(apply.stage(), TransformStage::Loaded);
        assert!(!output.exists());

        // A missing non-target column is rejected too.
        let mut short = postings();
        assert!(short.drop_column("job_type"));
        let mut apply = FeatureTransformer::from_dataset(config(&dir), short);
        let err = apply.apply_fitted(encoders, &output).unwrap_err();
        assert!(err.to_string().contains("missing columns: job_type"));
    }
}
