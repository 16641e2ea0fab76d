//! Configuration system for jobprep.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/jobprep/config.toml` and/or `.jobprep/config.toml`
//! in the workspace directory. Relative paths are resolved against the workspace.

use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for every pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobprepConfig {
    /// Root directory for all generated artifacts.
    pub artifacts_root: PathBuf,
    #[serde(default)]
    pub data_validation: DataValidationConfig,
    #[serde(default)]
    pub data_transformation: DataTransformationConfig,
    #[serde(default)]
    pub model_trainer: ModelTrainerConfig,
    #[serde(default)]
    pub model_evaluation: ModelEvaluationConfig,
}

impl Default for JobprepConfig {
    fn default() -> Self {
        Self {
            artifacts_root: PathBuf::from("artifacts"),
            data_validation: DataValidationConfig::default(),
            data_transformation: DataTransformationConfig::default(),
            model_trainer: ModelTrainerConfig::default(),
            model_evaluation: ModelEvaluationConfig::default(),
        }
    }
}

/// Data validation stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataValidationConfig {
    pub root_dir: PathBuf,
    /// Raw CSV produced by ingestion.
    pub unzip_data_dir: PathBuf,
    /// Human-readable gate status.
    pub status_file: PathBuf,
    /// Typed gate status consumed by the transformation stage.
    pub status_json_file: PathBuf,
    /// De-duplicated copy of the input; the raw file is never overwritten.
    pub validated_data_file: PathBuf,
    pub report_file: PathBuf,
    /// Schema YAML; the built-in job-posting schema is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_file: Option<PathBuf>,
}

impl Default for DataValidationConfig {
    fn default() -> Self {
        let root = PathBuf::from("artifacts/data_validation");
        Self {
            unzip_data_dir: PathBuf::from("artifacts/data_ingestion/job_postings.csv"),
            status_file: root.join("status.txt"),
            status_json_file: root.join("status.json"),
            validated_data_file: root.join("validated_data.csv"),
            report_file: root.join("validation_report.json"),
            schema_file: None,
            root_dir: root,
        }
    }
}

/// Which rows `drop_incomplete_rows` removes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Drop rows with a null in any of `required_fields`.
    RequiredFieldsOnly,
    /// Drop rows with a null anywhere.
    #[default]
    AnyNull,
}

/// How a fitted categorical encoder treats values it has never seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnseenValuePolicy {
    /// Encode as `-1`.
    #[default]
    Sentinel,
    /// Encode as null, leaving the row to the drop policy.
    Null,
}

/// Data transformation stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTransformationConfig {
    pub root_dir: PathBuf,
    pub data_path: PathBuf,
    pub train_fraction: f64,
    pub seed: u64,
    pub drop_policy: DropPolicy,
    pub required_fields: Vec<String>,
    pub categorical_fields: Vec<String>,
    pub date_field: String,
    pub qualifications_field: String,
    pub unseen_policy: UnseenValuePolicy,
    pub encoders_file: PathBuf,
    pub lineage_file: PathBuf,
}

impl Default for DataTransformationConfig {
    fn default() -> Self {
        let root = PathBuf::from("artifacts/data_transformation");
        Self {
            data_path: PathBuf::from("artifacts/data_validation/validated_data.csv"),
            train_fraction: 0.8,
            seed: 44,
            drop_policy: DropPolicy::default(),
            required_fields: vec![
                "job_qualifications".into(),
                "job_type".into(),
                "job_location".into(),
            ],
            categorical_fields: vec![
                "title".into(),
                "job_location".into(),
                "company_name".into(),
                "job_type".into(),
            ],
            date_field: "date_of_job_post".into(),
            qualifications_field: "job_qualifications".into(),
            unseen_policy: UnseenValuePolicy::default(),
            encoders_file: root.join("encoders.json"),
            lineage_file: root.join("lineage.json"),
            root_dir: root,
        }
    }
}

impl DataTransformationConfig {
    pub fn train_data_path(&self) -> PathBuf {
        self.root_dir.join("train_data.csv")
    }

    pub fn test_data_path(&self) -> PathBuf {
        self.root_dir.join("test_data.csv")
    }
}

/// Model training stage configuration (ElasticNet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTrainerConfig {
    pub root_dir: PathBuf,
    pub train_data_path: PathBuf,
    pub model_name: String,
    /// Pass-through text columns excluded from the feature matrix.
    pub columns_to_drop: Vec<String>,
    pub alpha: f64,
    pub l1_ratio: f64,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for ModelTrainerConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("artifacts/model_trainer"),
            train_data_path: PathBuf::from("artifacts/data_transformation/train_data.csv"),
            model_name: "model.json".into(),
            columns_to_drop: vec![
                "date_of_job_post".into(),
                "job_link".into(),
                "job_qualifications".into(),
                "job_description".into(),
                "job_summary".into(),
            ],
            alpha: 0.2,
            l1_ratio: 0.1,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

impl ModelTrainerConfig {
    pub fn model_path(&self) -> PathBuf {
        self.root_dir.join(&self.model_name)
    }
}

/// Model evaluation stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEvaluationConfig {
    pub root_dir: PathBuf,
    pub test_data_path: PathBuf,
    pub model_path: PathBuf,
    pub metric_file_name: PathBuf,
}

impl Default for ModelEvaluationConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("artifacts/model_evaluation"),
            test_data_path: PathBuf::from("artifacts/data_transformation/test_data.csv"),
            model_path: PathBuf::from("artifacts/model_trainer/model.json"),
            metric_file_name: PathBuf::from("artifacts/model_evaluation/metrics.json"),
        }
    }
}

impl JobprepConfig {
    /// Reject values that would make a stage meaningless.
    pub fn validate(&self) -> Result<()> {
        let t = &self.data_transformation;
        if !(t.train_fraction > 0.0 && t.train_fraction < 1.0) {
            return Err(ConfigError::invalid(format!(
                "data_transformation.train_fraction must be in (0, 1), got {}",
                t.train_fraction
            )));
        }
        if t.drop_policy == DropPolicy::RequiredFieldsOnly && t.required_fields.is_empty() {
            return Err(ConfigError::invalid(
                "data_transformation.required_fields must not be empty with drop_policy = required_fields_only",
            ));
        }
        let m = &self.model_trainer;
        if m.alpha < 0.0 {
            return Err(ConfigError::invalid("model_trainer.alpha must be >= 0"));
        }
        if !(0.0..=1.0).contains(&m.l1_ratio) {
            return Err(ConfigError::invalid(
                "model_trainer.l1_ratio must be in [0, 1]",
            ));
        }
        if m.max_iter == 0 {
            return Err(ConfigError::invalid("model_trainer.max_iter must be > 0"));
        }
        Ok(())
    }

    /// Make every relative path absolute with respect to `workspace`.
    pub fn resolve_paths(&mut self, workspace: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = workspace.join(&*p);
            }
        };

        fix(&mut self.artifacts_root);

        let v = &mut self.data_validation;
        for p in [
            &mut v.root_dir,
            &mut v.unzip_data_dir,
            &mut v.status_file,
            &mut v.status_json_file,
            &mut v.validated_data_file,
            &mut v.report_file,
        ] {
            fix(p);
        }
        if let Some(schema) = v.schema_file.as_mut() {
            fix(schema);
        }

        let t = &mut self.data_transformation;
        for p in [
            &mut t.root_dir,
            &mut t.data_path,
            &mut t.encoders_file,
            &mut t.lineage_file,
        ] {
            fix(p);
        }

        let m = &mut self.model_trainer;
        for p in [&mut m.root_dir, &mut m.train_data_path] {
            fix(p);
        }

        let e = &mut self.model_evaluation;
        for p in [
            &mut e.root_dir,
            &mut e.test_data_path,
            &mut e.model_path,
            &mut e.metric_file_name,
        ] {
            fix(p);
        }
    }

    /// Directories every stage expects to exist before it writes.
    pub fn stage_directories(&self) -> Vec<&Path> {
        vec![
            self.artifacts_root.as_path(),
            self.data_validation.root_dir.as_path(),
            self.data_transformation.root_dir.as_path(),
            self.model_trainer.root_dir.as_path(),
            self.model_evaluation.root_dir.as_path(),
        ]
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "jobprep", "jobprep")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Path of the workspace-level configuration file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".jobprep").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit config file (passed as argument)
/// 2. Environment variables (prefixed with `JOBPREP_`)
/// 3. Workspace-local config (`.jobprep/config.toml`)
/// 4. User config (`~/.config/jobprep/config.toml`)
/// 5. Built-in defaults
pub fn load_config(workspace: Option<&Path>, explicit: Option<&Path>) -> Result<JobprepConfig> {
    let mut figment = Figment::from(Serialized::defaults(JobprepConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // JOBPREP_DATA_TRANSFORMATION__SEED, JOBPREP_MODEL_TRAINER__ALPHA, etc.
    figment = figment.merge(Env::prefixed("JOBPREP_").split("__"));

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    let mut config: JobprepConfig = figment.extract()?;
    if let Some(ws) = workspace {
        config.resolve_paths(ws);
    }
    config.validate()?;
    Ok(config)
}

/// Render the configuration as TOML.
pub fn to_toml(config: &JobprepConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
