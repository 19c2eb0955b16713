use super::artifact::ArtifactEnvelope;
use crate::domain::errors::ModelError;
use crate::domain::ml::regressor::{ModelKind, Regressor, TrainParams};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Linear next-step model over a window, fitted by mini-batch gradient descent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearWindowRegressor {
    window_size: usize,
    weights: Vec<f64>,
    bias: f64,
    fitted: bool,
}

impl LinearWindowRegressor {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            weights: vec![0.0; window_size],
            bias: 0.0,
            fitted: false,
        }
    }

    pub(crate) fn from_envelope(envelope: ArtifactEnvelope) -> Result<Self, ModelError> {
        envelope.state()
    }

    fn mse(weights: &Array1<f64>, bias: f64, x: ArrayView2<f64>, y: ArrayView1<f64>) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        let residual = x.dot(weights) + bias - y;
        residual.mapv(|r| r * r).sum() / y.len() as f64
    }
}

impl Regressor for LinearWindowRegressor {
    fn fit(
        &mut self,
        inputs: &Array2<f64>,
        targets: &Array1<f64>,
        params: &TrainParams,
    ) -> Result<(), ModelError> {
        let n = inputs.nrows();
        if n == 0 {
            return Err(ModelError::Training("no training windows".to_string()));
        }
        if inputs.ncols() != self.window_size || targets.len() != n {
            return Err(ModelError::Training(format!(
                "shape mismatch: inputs {:?}, targets {}, window {}",
                inputs.dim(),
                targets.len(),
                self.window_size
            )));
        }

        // Validation rows come from the chronological tail; at least one row always trains.
        let val_rows = ((n as f64) * params.validation_split.clamp(0.0, 0.5)).floor() as usize;
        let train_rows = (n - val_rows).max(1);
        let (x_train, x_val) = (
            inputs.slice(s![..train_rows, ..]),
            inputs.slice(s![train_rows.., ..]),
        );
        let (y_train, y_val) = (targets.slice(s![..train_rows]), targets.slice(s![train_rows..]));

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut weights =
            Array1::from_iter((0..self.window_size).map(|_| rng.random_range(-0.01..0.01)));
        let mut bias = y_train.mean().unwrap_or(0.0);

        let batch_size = params.batch_size.max(1);
        let lr = params.learning_rate;
        let epochs = params.epochs.max(1);

        info!(
            "Training linear window model (epochs: {}, batch: {}, lr: {}) on {} windows, \
             {} held for validation",
            epochs, batch_size, lr, train_rows, val_rows
        );

        for epoch in 0..epochs {
            let mut start = 0;
            while start < train_rows {
                let end = (start + batch_size).min(train_rows);
                let xb = x_train.slice(s![start..end, ..]);
                let yb = y_train.slice(s![start..end]);
                let m = (end - start) as f64;

                let err = xb.dot(&weights) + bias - yb;
                let grad_w = xb.t().dot(&err) * (2.0 / m);
                let grad_b = err.sum() * 2.0 / m;

                weights.scaled_add(-lr, &grad_w);
                bias -= lr * grad_b;
                start = end;
            }

            let train_loss = Self::mse(&weights, bias, x_train, y_train);
            if !train_loss.is_finite() {
                return Err(ModelError::Training(format!(
                    "loss diverged at epoch {} (learning rate {})",
                    epoch + 1,
                    lr
                )));
            }
            if (epoch + 1) % 10 == 0 || epoch + 1 == epochs {
                debug!(
                    "epoch {}/{}: loss={:.6} val_loss={:.6}",
                    epoch + 1,
                    epochs,
                    train_loss,
                    Self::mse(&weights, bias, x_val, y_val)
                );
            }
        }

        self.weights = weights.to_vec();
        self.bias = bias;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, inputs: &Array2<f64>) -> Result<Vec<f64>, ModelError> {
        if !self.fitted {
            return Err(ModelError::Prediction("model is not fitted".to_string()));
        }
        if inputs.ncols() != self.window_size {
            return Err(ModelError::Prediction(format!(
                "expected windows of {} values, got {}",
                self.window_size,
                inputs.ncols()
            )));
        }
        let weights = ArrayView1::from(self.weights.as_slice());
        Ok((inputs.dot(&weights) + self.bias).to_vec())
    }

    fn serialize(&self) -> Result<Vec<u8>, ModelError> {
        if !self.fitted {
            return Err(ModelError::Serialization(
                "refusing to persist an unfitted model".to_string(),
            ));
        }
        ArtifactEnvelope::encode(ModelKind::Linear, self.window_size, self)
    }

    fn window_size(&self) -> usize {
        self.window_size
    }

    fn name(&self) -> &str {
        "Linear Window (mini-batch GD)"
    }
}
