use crate::domain::errors::ModelError;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hyperparameters handed to [`Regressor::fit`].
///
/// Each model reads the subset it understands and ignores the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainParams {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Tail fraction of the training windows kept aside for a validation loss
    pub validation_split: f64,
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 32,
            learning_rate: 0.05,
            validation_split: 0.1,
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            seed: 42,
        }
    }
}

/// Concrete model families that can be trained and persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Forest,
    Linear,
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forest" | "random_forest" => Ok(ModelKind::Forest),
            "linear" => Ok(ModelKind::Linear),
            _ => anyhow::bail!("Invalid MODEL_KIND: {}. Must be 'forest' or 'linear'", s),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Forest => write!(f, "forest"),
            ModelKind::Linear => write!(f, "linear"),
        }
    }
}

/// A trainable next-step regressor over fixed-length windows.
///
/// The forecasting pipeline only relies on this contract; model internals stay opaque.
pub trait Regressor: Send + Sync {
    /// Fits on `inputs` (one window per row) against `targets`.
    fn fit(
        &mut self,
        inputs: &Array2<f64>,
        targets: &Array1<f64>,
        params: &TrainParams,
    ) -> Result<(), ModelError>;

    /// One prediction per input row, in the same scaled units as the targets.
    fn predict(&self, inputs: &Array2<f64>) -> Result<Vec<f64>, ModelError>;

    /// Encodes the fitted state as a self-describing artifact.
    fn serialize(&self) -> Result<Vec<u8>, ModelError>;

    /// Number of values per input row the model was built for.
    fn window_size(&self) -> usize;

    fn name(&self) -> &str;
}

/// Builds fresh regressors and restores persisted ones
pub trait RegressorFactory: Send + Sync {
    fn create(&self, window_size: usize) -> Box<dyn Regressor>;

    fn deserialize(&self, bytes: &[u8]) -> Result<Box<dyn Regressor>, ModelError>;
}
