use crate::domain::errors::EvaluationInputError;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median};

/// Accuracy of a forecast against the realized prices, in price units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// Mean absolute percentage error over non-zero true values, in percent
    pub mape: f64,
    pub r2: f64,
    pub median_abs_error: f64,
    pub samples: usize,
}

impl ForecastMetrics {
    /// Scores `prediction` against `truth`.
    ///
    /// Both sequences must be non-empty, equally long and finite.
    pub fn evaluate(truth: &[f64], prediction: &[f64]) -> Result<Self, EvaluationInputError> {
        if truth.len() != prediction.len() {
            return Err(EvaluationInputError::LengthMismatch {
                truth: truth.len(),
                prediction: prediction.len(),
            });
        }
        if truth.is_empty() {
            return Err(EvaluationInputError::Empty);
        }
        if let Some(index) = truth
            .iter()
            .zip(prediction)
            .position(|(t, p)| !t.is_finite() || !p.is_finite())
        {
            return Err(EvaluationInputError::NonFinite { index });
        }

        let n = truth.len() as f64;
        let abs_errors: Vec<f64> = truth
            .iter()
            .zip(prediction)
            .map(|(t, p)| (t - p).abs())
            .collect();

        let mae = abs_errors.iter().sum::<f64>() / n;
        let sse: f64 = abs_errors.iter().map(|e| e * e).sum();
        let mse = sse / n;
        let rmse = mse.sqrt();

        let (pct_sum, pct_count) = truth
            .iter()
            .zip(&abs_errors)
            .filter(|(t, _)| **t != 0.0)
            .fold((0.0, 0usize), |(sum, count), (t, e)| {
                (sum + e / t.abs(), count + 1)
            });
        let mape = if pct_count > 0 {
            pct_sum / pct_count as f64 * 100.0
        } else {
            0.0
        };

        let mean_truth = truth.iter().sum::<f64>() / n;
        let sst: f64 = truth.iter().map(|t| (t - mean_truth).powi(2)).sum();
        let r2 = if sst > 0.0 { 1.0 - sse / sst } else { 0.0 };

        let median_abs_error = Data::new(abs_errors).median();

        Ok(Self {
            mae,
            mse,
            rmse,
            mape,
            r2,
            median_abs_error,
            samples: truth.len(),
        })
    }
}
