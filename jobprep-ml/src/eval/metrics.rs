//! Regression metrics.

use crate::error::MlError;
use serde::{Deserialize, Serialize};

/// Regression metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    #[serde(rename = "r2")]
    pub r_squared: f64,
    pub explained_variance: Option<f64>,
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compare predictions with actual values.
    ///
    /// A constant target gives R² (and explained variance) of 1 for a
    /// perfect prediction and 0 otherwise.
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Result<Self, MlError> {
        if actual.len() != predicted.len() {
            return Err(MlError::evaluation(format!(
                "{} actual values but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }
        if actual.is_empty() {
            return Err(MlError::evaluation("no samples to evaluate"));
        }
        let n = actual.len() as f64;

        let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let mse = ss_res / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let mean = actual.iter().sum::<f64>() / n;
        let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

        let error_mean = errors.iter().sum::<f64>() / n;
        let error_var = errors.iter().map(|e| (e - error_mean).powi(2)).sum::<f64>();

        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r_squared: ratio_score(ss_res, ss_tot),
            explained_variance: Some(ratio_score(error_var, ss_tot)),
            n_samples: actual.len(),
        })
    }
}

fn ratio_score(residual: f64, total: f64) -> f64 {
    if total == 0.0 {
        if residual == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - residual / total
    }
}
