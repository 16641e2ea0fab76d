//! ElasticNet regression by cyclic coordinate descent.
//!
//! Minimizes
//! `1/(2n) * ||y - Xw - b||^2 + alpha * l1_ratio * ||w||_1 + alpha * (1 - l1_ratio) / 2 * ||w||^2`
//! with an unpenalized intercept, fitted on centered data.

use crate::error::MlError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticNet {
    pub alpha: f64,
    pub l1_ratio: f64,
    pub max_iter: usize,
    pub tol: f64,
}

/// Result of a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticNetFit {
    pub coef: Vec<f64>,
    pub intercept: f64,
    pub n_iter: usize,
    pub converged: bool,
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

impl ElasticNet {
    pub fn new(alpha: f64, l1_ratio: f64, max_iter: usize, tol: f64) -> Self {
        Self {
            alpha,
            l1_ratio,
            max_iter,
            tol,
        }
    }

    /// Fit on row-major `x` and targets `y`.
    pub fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<ElasticNetFit, MlError> {
        let n = x.len();
        if n == 0 {
            return Err(MlError::training("no training rows"));
        }
        if y.len() != n {
            return Err(MlError::training(format!(
                "{} feature rows but {} targets",
                n,
                y.len()
            )));
        }
        let p = x[0].len();
        if x.iter().any(|row| row.len() != p) {
            return Err(MlError::training("ragged feature matrix"));
        }
        let nf = n as f64;

        let x_mean: Vec<f64> = (0..p)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / nf)
            .collect();
        let y_mean = y.iter().sum::<f64>() / nf;

        // Column-major centered copy.
        let xc: Vec<Vec<f64>> = (0..p)
            .map(|j| x.iter().map(|row| row[j] - x_mean[j]).collect())
            .collect();
        let mut residual: Vec<f64> = y.iter().map(|v| v - y_mean).collect();
        let col_sq: Vec<f64> = xc.iter().map(|c| c.iter().map(|v| v * v).sum()).collect();

        let l1 = self.alpha * self.l1_ratio * nf;
        let l2 = self.alpha * (1.0 - self.l1_ratio) * nf;

        let mut coef = vec![0.0; p];
        let mut n_iter = 0;
        let mut converged = false;
        while n_iter < self.max_iter {
            n_iter += 1;
            let mut max_delta = 0.0_f64;
            let mut max_coef = 0.0_f64;
            for j in 0..p {
                if col_sq[j] == 0.0 {
                    continue;
                }
                let old = coef[j];
                let rho: f64 = xc[j]
                    .iter()
                    .zip(&residual)
                    .map(|(xv, r)| xv * r)
                    .sum::<f64>()
                    + old * col_sq[j];
                let new = soft_threshold(rho, l1) / (col_sq[j] + l2);
                if new != old {
                    let delta = new - old;
                    for (r, xv) in residual.iter_mut().zip(&xc[j]) {
                        *r -= delta * xv;
                    }
                    coef[j] = new;
                }
                max_delta = max_delta.max((new - old).abs());
                max_coef = max_coef.max(new.abs());
            }
            if max_coef == 0.0 || max_delta / max_coef < self.tol {
                converged = true;
                break;
            }
        }
        if !converged {
            tracing::warn!(max_iter = self.max_iter, "ElasticNet did not converge");
        }

        let intercept = y_mean
            - coef
                .iter()
                .zip(&x_mean)
                .map(|(w, m)| w * m)
                .sum::<f64>();
        Ok(ElasticNetFit {
            coef,
            intercept,
            n_iter,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
    }

    #[test]
    fn test_recovers_linear_relation() {
        let x: Vec<Vec<f64>> = (0..50)
            .map(|i| vec![i as f64 / 10.0, ((i * 7) % 13) as f64])
            .collect();
        let y: Vec<f64> = x.iter().map(|r| 3.0 * r[0] - 2.0 * r[1] + 5.0).collect();

        let fit = ElasticNet::new(1e-6, 0.5, 10_000, 1e-8).fit(&x, &y).unwrap();
        assert!(fit.converged);
        assert!((fit.coef[0] - 3.0).abs() < 1e-3, "coef {:?}", fit.coef);
        assert!((fit.coef[1] + 2.0).abs() < 1e-3, "coef {:?}", fit.coef);
        assert!((fit.intercept - 5.0).abs() < 1e-2);
    }

    #[test]
    fn test_strong_l1_zeroes_coefficients() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| i as f64 * 0.01).collect();
        let fit = ElasticNet::new(100.0, 1.0, 100, 1e-4).fit(&x, &y).unwrap();
        assert_eq!(fit.coef, vec![0.0]);
        assert!((fit.intercept - 0.095).abs() < 1e-9);
    }

    #[test]
    fn test_shape_errors() {
        let net = ElasticNet::new(0.1, 0.5, 10, 1e-4);
        assert!(net.fit(&[], &[]).is_err());
        assert!(net.fit(&[vec![1.0]], &[1.0, 2.0]).is_err());
    }
}
