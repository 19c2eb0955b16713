use super::artifact::ArtifactEnvelope;
use super::forest_regressor::ForestRegressor;
use super::linear_regressor::LinearWindowRegressor;
use crate::domain::errors::ModelError;
use crate::domain::ml::regressor::{ModelKind, Regressor, RegressorFactory};

/// Creates the configured model kind and restores any persisted kind.
#[derive(Debug, Clone, Copy)]
pub struct DefaultRegressorFactory {
    kind: ModelKind,
}

impl DefaultRegressorFactory {
    pub fn new(kind: ModelKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }
}

impl RegressorFactory for DefaultRegressorFactory {
    fn create(&self, window_size: usize) -> Box<dyn Regressor> {
        match self.kind {
            ModelKind::Forest => Box::new(ForestRegressor::new(window_size)),
            ModelKind::Linear => Box::new(LinearWindowRegressor::new(window_size)),
        }
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Box<dyn Regressor>, ModelError> {
        let envelope = ArtifactEnvelope::decode(bytes)?;
        Ok(match envelope.kind {
            ModelKind::Forest => Box::new(ForestRegressor::from_envelope(envelope)?),
            ModelKind::Linear => Box::new(LinearWindowRegressor::from_envelope(envelope)?),
        })
    }
}
