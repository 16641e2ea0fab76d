//! Model training stage: standardized ElasticNet on the transformed train set.

use crate::data::dataset::{Dataset, type_name};
use crate::data::source;
use crate::error::MlError;
use crate::training::elastic_net::ElasticNet;
use crate::training::scaler::StandardScaler;
use chrono::{DateTime, Utc};
use jobprep_core::ModelTrainerConfig;
use jobprep_core::persistence::{atomic_write_json, load_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// A fitted linear model together with the preprocessing it expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    pub target_column: String,
    pub scaler: StandardScaler,
    pub coef: Vec<f64>,
    pub intercept: f64,
    pub estimator: ElasticNet,
    pub n_train_rows: usize,
    pub trained_at: DateTime<Utc>,
}

impl LinearModel {
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let scaled = self.scaler.transform_row(row);
        self.intercept
            + scaled
                .iter()
                .zip(&self.coef)
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn save(&self, path: &Path) -> Result<(), MlError> {
        atomic_write_json(path, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, MlError> {
        load_json(path)?.ok_or_else(|| MlError::not_found(format!("model {}", path.display())))
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        _ => None,
    }
}

/// Feature rows and targets for `features` / `target`.
///
/// Rows with a null in any selected column are skipped. Any other
/// non-numeric cell is an error naming the column.
pub fn design_matrix(
    dataset: &Dataset,
    features: &[String],
    target: &str,
) -> Result<(Vec<Vec<f64>>, Vec<f64>), MlError> {
    let column = |name: &str| {
        dataset
            .column_index(name)
            .ok_or_else(|| MlError::dataset(format!("column '{name}' not found")))
    };
    let feature_idx = features
        .iter()
        .map(|f| column(f))
        .collect::<Result<Vec<_>, _>>()?;
    let target_idx = column(target)?;

    let mut x = Vec::with_capacity(dataset.row_count());
    let mut y = Vec::with_capacity(dataset.row_count());
    let mut skipped = 0;
    'rows: for (row_no, row) in dataset.rows().iter().enumerate() {
        let mut values = Vec::with_capacity(feature_idx.len() + 1);
        for &idx in feature_idx.iter().chain(std::iter::once(&target_idx)) {
            let cell = &row[idx];
            if cell.is_null() {
                skipped += 1;
                continue 'rows;
            }
            let value = numeric(cell).ok_or_else(|| {
                MlError::dataset(format!(
                    "column '{}' row {row_no} holds a {} value; expected a number",
                    dataset.columns()[idx],
                    type_name(cell)
                ))
            })?;
            values.push(value);
        }
        y.extend(values.pop());
        x.push(values);
    }
    if skipped > 0 {
        tracing::warn!(skipped, "Skipped rows with missing values");
    }
    Ok((x, y))
}

/// Trains and persists the regression model.
pub struct ModelTrainer {
    config: ModelTrainerConfig,
    target_column: String,
}

impl ModelTrainer {
    pub fn new(config: ModelTrainerConfig, target_column: impl Into<String>) -> Self {
        Self {
            config,
            target_column: target_column.into(),
        }
    }

    /// Columns used as features: everything except dropped columns and the target.
    pub fn feature_names(&self, dataset: &Dataset) -> Vec<String> {
        dataset
            .columns()
            .iter()
            .filter(|c| **c != self.target_column && !self.config.columns_to_drop.contains(c))
            .cloned()
            .collect()
    }

    /// Fit on an in-memory training set.
    pub fn fit(&self, train: &Dataset) -> Result<LinearModel, MlError> {
        let feature_names = self.feature_names(train);
        if feature_names.is_empty() {
            return Err(MlError::training("no feature columns left after dropping"));
        }
        let (x, y) = design_matrix(train, &feature_names, &self.target_column)?;
        if x.is_empty() {
            return Err(MlError::training("no complete training rows"));
        }

        let scaler = StandardScaler::fit(&x)?;
        let estimator = ElasticNet::new(
            self.config.alpha,
            self.config.l1_ratio,
            self.config.max_iter,
            self.config.tol,
        );
        let fit = estimator.fit(&scaler.transform(&x), &y)?;
        tracing::info!(
            features = feature_names.len(),
            rows = x.len(),
            iterations = fit.n_iter,
            converged = fit.converged,
            "Model fitted"
        );

        Ok(LinearModel {
            feature_names,
            target_column: self.target_column.clone(),
            scaler,
            coef: fit.coef,
            intercept: fit.intercept,
            estimator,
            n_train_rows: x.len(),
            trained_at: Utc::now(),
        })
    }

    /// Load the train CSV, fit, and save the model to `model_path()`.
    pub fn run(&self) -> Result<LinearModel, MlError> {
        let train = source::read_csv(&self.config.train_data_path)?;
        let model = self.fit(&train)?;
        let path = self.config.model_path();
        model.save(&path)?;
        tracing::info!(path = %path.display(), "Saved model");
        Ok(model)
    }
}
