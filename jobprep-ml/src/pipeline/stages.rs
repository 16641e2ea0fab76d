//! The four pipeline stages and the driver that runs them in sequence.

use crate::data::schema::SchemaDefinition;
use crate::data::validate::Validator;
use crate::error::MlError;
use crate::eval::evaluator::ModelEvaluator;
use crate::pipeline::gate::check_gate;
use crate::pipeline::transformer::FeatureTransformer;
use crate::training::trainer::ModelTrainer;
use jobprep_core::JobprepConfig;
use jobprep_core::persistence::create_directories;

/// One step of the end-to-end pipeline.
pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, config: &JobprepConfig) -> Result<(), MlError>;
}

fn schema(config: &JobprepConfig) -> Result<SchemaDefinition, MlError> {
    SchemaDefinition::load_or_default(config.data_validation.schema_file.as_deref())
}

/// Validates the raw data and writes the gate status.
///
/// A non-conformant column set is recorded in the status, not returned as
/// an error; the transformation stage refuses to run on it.
pub struct DataValidationStage;

impl Stage for DataValidationStage {
    fn name(&self) -> &'static str {
        "Data Validation"
    }

    fn run(&self, config: &JobprepConfig) -> Result<(), MlError> {
        create_directories(&[&config.data_validation.root_dir])?;
        let mut validator = Validator::new(config.data_validation.clone(), schema(config)?)?;
        let report = validator.run_all()?;
        tracing::info!(
            rows = report.rows_after_dedup,
            duplicates = report.duplicates_removed,
            "Validation report written"
        );
        Ok(())
    }
}

/// Checks the gate, then builds the train/test feature sets.
pub struct DataTransformationStage;

impl Stage for DataTransformationStage {
    fn name(&self) -> &'static str {
        "Data Transformation"
    }

    fn run(&self, config: &JobprepConfig) -> Result<(), MlError> {
        let v = &config.data_validation;
        let schema = schema(config)?;
        check_gate(&v.status_json_file, &v.status_file, &schema)?;
        create_directories(&[&config.data_transformation.root_dir])?;
        FeatureTransformer::load(config.data_transformation.clone())?
            .with_target_column(schema.target_column)
            .run()?;
        Ok(())
    }
}

pub struct ModelTrainerStage;

impl Stage for ModelTrainerStage {
    fn name(&self) -> &'static str {
        "Model Trainer"
    }

    fn run(&self, config: &JobprepConfig) -> Result<(), MlError> {
        let target = schema(config)?.target_column;
        ModelTrainer::new(config.model_trainer.clone(), target).run()?;
        Ok(())
    }
}

pub struct ModelEvaluationStage;

impl Stage for ModelEvaluationStage {
    fn name(&self) -> &'static str {
        "Model Evaluation"
    }

    fn run(&self, config: &JobprepConfig) -> Result<(), MlError> {
        create_directories(&[&config.model_evaluation.root_dir])?;
        ModelEvaluator::new(config.model_evaluation.clone()).run()?;
        Ok(())
    }
}

/// Every stage, in execution order.
pub fn all_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(DataValidationStage),
        Box::new(DataTransformationStage),
        Box::new(ModelTrainerStage),
        Box::new(ModelEvaluationStage),
    ]
}

/// Run `stages` in order, stopping at the first failure.
pub fn run_pipeline(config: &JobprepConfig, stages: &[Box<dyn Stage>]) -> Result<(), MlError> {
    create_directories(&config.stage_directories())?;
    for stage in stages {
        tracing::info!(">>>>>> Stage {} started <<<<<<", stage.name());
        if let Err(e) = stage.run(config) {
            tracing::error!(stage = stage.name(), error = %e, "Stage failed");
            return Err(e);
        }
        tracing::info!(">>>>>> Stage {} completed <<<<<<", stage.name());
    }
    Ok(())
}
