use crate::domain::errors::ForecastError;
use crate::domain::market::series::RawSeries;
use crate::domain::ml::dataset::{WindowBlock, WindowedDataset};
use crate::domain::ml::scaler::MinMaxScaler;
use ndarray::{Array1, Array2};
use tracing::{debug, info};

/// Builds fixed-length windows and next-step targets from a price series.
pub struct WindowTransformer;

impl WindowTransformer {
    /// Scales `series` and slices it into windows of `window_size`.
    ///
    /// The scaler is fitted on the whole series, held-out tail included (a known lookahead,
    /// kept for compatibility with persisted models). Predictions made against the dataset
    /// are inverted with the returned scaler.
    pub fn prepare(
        series: &RawSeries,
        window_size: usize,
    ) -> Result<(WindowedDataset, MinMaxScaler), ForecastError> {
        let required = window_size + 1;
        if window_size == 0 || series.len() < required {
            return Err(ForecastError::InsufficientData {
                required: required.max(2),
                actual: series.len(),
            });
        }

        let prices = series.prices();
        let scaler = MinMaxScaler::fit(&prices).ok_or(ForecastError::InsufficientData {
            required,
            actual: 0,
        })?;
        let scaled = scaler.scale_all(&prices);
        debug!(
            "Scaled {} prices (min={:.4}, max={:.4})",
            scaled.len(),
            scaler.min(),
            scaler.max()
        );

        let n = scaled.len() - window_size;
        let inputs = Array2::from_shape_fn((n, window_size), |(row, col)| scaled[row + col]);
        let targets = Array1::from_iter(scaled[window_size..].iter().copied());
        let target_dates = series.dates()[window_size..].to_vec();

        info!("Prepared {} samples with window size {}", n, window_size);

        let dataset = WindowedDataset::new(
            window_size,
            WindowBlock {
                inputs,
                targets,
                target_dates,
            },
            scaler,
        );
        Ok((dataset, scaler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn series(prices: &[f64]) -> RawSeries {
        let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        RawSeries::from_observations(
            prices
                .iter()
                .enumerate()
                .map(|(i, p)| (start + Days::new(i as u64), Some(*p))),
        )
    }

    #[test]
    fn test_window_counts_for_many_sizes() {
        for len in 2..30usize {
            let prices: Vec<f64> = (0..len).map(|i| 50.0 + (i as f64).cos()).collect();
            for window in 1..len {
                let (ds, _) = WindowTransformer::prepare(&series(&prices), window).unwrap();
                assert_eq!(ds.len(), len - window);
                assert_eq!(ds.inputs().nrows(), len - window);
                assert_eq!(ds.inputs().ncols(), window);
                assert_eq!(ds.targets().len(), len - window);
                assert_eq!(ds.target_dates().len(), len - window);
            }
        }
    }

    #[test]
    fn test_windows_align_with_targets() {
        let prices = [10.0, 20.0, 30.0, 40.0, 50.0];
        let (ds, scaler) = WindowTransformer::prepare(&series(&prices), 2).unwrap();

        // Row i holds scaled[i..i+2], target is scaled[i+2]
        for i in 0..ds.len() {
            assert_eq!(ds.inputs()[[i, 0]], scaler.scale(prices[i]));
            assert_eq!(ds.inputs()[[i, 1]], scaler.scale(prices[i + 1]));
            assert_eq!(ds.targets()[i], scaler.scale(prices[i + 2]));
        }
        assert_eq!(ds.scaler(), &scaler);
    }

    #[test]
    fn test_short_series_fails_without_partial_data() {
        let prices = [1.0, 2.0, 3.0];
        for window in [3, 4, 60] {
            match WindowTransformer::prepare(&series(&prices), window) {
                Err(ForecastError::InsufficientData { required, actual }) => {
                    assert_eq!(required, window + 1);
                    assert_eq!(actual, 3);
                }
                other => panic!("expected InsufficientData, got {:?}", other.map(|(d, _)| d.len())),
            }
        }
    }

    #[test]
    fn test_zero_window_is_rejected() {
        assert!(matches!(
            WindowTransformer::prepare(&series(&[1.0, 2.0]), 0),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_scaler_sees_whole_series() {
        let prices = [5.0, 1.0, 9.0, 3.0];
        let (_, scaler) = WindowTransformer::prepare(&series(&prices), 1).unwrap();
        assert_eq!(scaler.min(), 1.0);
        assert_eq!(scaler.max(), 9.0);
        for p in prices {
            assert!((scaler.inverse(scaler.scale(p)) - p).abs() < 1e-6);
        }
    }
}
