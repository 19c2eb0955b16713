use super::artifact::ArtifactEnvelope;
use crate::domain::errors::ModelError;
use crate::domain::ml::regressor::{ModelKind, Regressor, TrainParams};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::info;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random forest over the raw window values (smartcore)
#[derive(Serialize, Deserialize)]
pub struct ForestRegressor {
    window_size: usize,
    model: Option<Forest>,
}

impl ForestRegressor {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            model: None,
        }
    }

    pub(crate) fn from_envelope(envelope: ArtifactEnvelope) -> Result<Self, ModelError> {
        envelope.state()
    }

    fn to_matrix(inputs: &Array2<f64>) -> Result<DenseMatrix<f64>, String> {
        let rows: Vec<Vec<f64>> = inputs.rows().into_iter().map(|r| r.to_vec()).collect();
        DenseMatrix::from_2d_vec(&rows).map_err(|e| format!("Matrix creation failed: {}", e))
    }
}

impl Regressor for ForestRegressor {
    fn fit(
        &mut self,
        inputs: &Array2<f64>,
        targets: &Array1<f64>,
        params: &TrainParams,
    ) -> Result<(), ModelError> {
        if inputs.nrows() == 0 {
            return Err(ModelError::Training("no training windows".to_string()));
        }
        if inputs.ncols() != self.window_size {
            return Err(ModelError::Training(format!(
                "expected windows of {} values, got {}",
                self.window_size,
                inputs.ncols()
            )));
        }

        let x = Self::to_matrix(inputs).map_err(ModelError::Training)?;
        let y = targets.to_vec();

        let forest_params = RandomForestRegressorParameters::default()
            .with_n_trees(params.n_trees)
            .with_max_depth(params.max_depth)
            .with_min_samples_split(params.min_samples_split)
            .with_seed(params.seed);

        info!(
            "Training Random Forest Regressor (Trees: {}, Depth: {}, MinSplit: {}) on {} windows",
            params.n_trees,
            params.max_depth,
            params.min_samples_split,
            inputs.nrows()
        );

        let model = Forest::fit(&x, &y, forest_params)
            .map_err(|e| ModelError::Training(e.to_string()))?;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, inputs: &Array2<f64>) -> Result<Vec<f64>, ModelError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ModelError::Prediction("model is not fitted".to_string()))?;
        if inputs.ncols() != self.window_size {
            return Err(ModelError::Prediction(format!(
                "expected windows of {} values, got {}",
                self.window_size,
                inputs.ncols()
            )));
        }
        if inputs.nrows() == 0 {
            return Ok(Vec::new());
        }
        let x = Self::to_matrix(inputs).map_err(ModelError::Prediction)?;
        model
            .predict(&x)
            .map_err(|e| ModelError::Prediction(e.to_string()))
    }

    fn serialize(&self) -> Result<Vec<u8>, ModelError> {
        if self.model.is_none() {
            return Err(ModelError::Serialization(
                "refusing to persist an unfitted forest".to_string(),
            ));
        }
        ArtifactEnvelope::encode(ModelKind::Forest, self.window_size, self)
    }

    fn window_size(&self) -> usize {
        self.window_size
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }
}
