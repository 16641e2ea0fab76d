//! Model evaluation stage.

use crate::data::Dataset;
use crate::data::source;
use crate::error::MlError;
use crate::eval::metrics::RegressionMetrics;
use crate::training::trainer::{LinearModel, design_matrix};
use jobprep_core::ModelEvaluationConfig;
use jobprep_core::persistence::atomic_write_json;

/// Scores a saved model on the test set and writes `metrics.json`.
pub struct ModelEvaluator {
    config: ModelEvaluationConfig,
}

impl ModelEvaluator {
    pub fn new(config: ModelEvaluationConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(
        &self,
        model: &LinearModel,
        test: &Dataset,
    ) -> Result<RegressionMetrics, MlError> {
        if let Some(missing) = model.feature_names.iter().find(|f| !test.has_column(f)) {
            return Err(MlError::evaluation(format!(
                "test data lacks model feature '{missing}'"
            )));
        }
        let (x, y) = design_matrix(test, &model.feature_names, &model.target_column)?;
        RegressionMetrics::compute(&y, &model.predict(&x))
    }

    pub fn run(&self) -> Result<RegressionMetrics, MlError> {
        let model = LinearModel::load(&self.config.model_path)?;
        let test = source::read_csv(&self.config.test_data_path)?;
        let metrics = self.evaluate(&model, &test)?;
        atomic_write_json(&self.config.metric_file_name, &metrics)?;
        tracing::info!(
            rmse = metrics.rmse,
            mae = metrics.mae,
            r2 = metrics.r_squared,
            path = %self.config.metric_file_name.display(),
            "Saved evaluation metrics"
        );
        Ok(metrics)
    }
}
