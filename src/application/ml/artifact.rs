use crate::domain::errors::ModelError;
use crate::domain::ml::regressor::ModelKind;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// On-disk layout shared by every model kind: metadata plus the model's own state.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    pub format_version: u32,
    pub kind: ModelKind,
    pub window_size: usize,
    pub trained_at: DateTime<Utc>,
    pub state: serde_json::Value,
}

impl ArtifactEnvelope {
    pub fn encode<S: Serialize>(
        kind: ModelKind,
        window_size: usize,
        state: &S,
    ) -> Result<Vec<u8>, ModelError> {
        let envelope = Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            kind,
            window_size,
            trained_at: Utc::now(),
            state: serde_json::to_value(state)
                .map_err(|e| ModelError::Serialization(e.to_string()))?,
        };
        serde_json::to_vec(&envelope).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ModelError> {
        let envelope: Self = serde_json::from_slice(bytes)
            .map_err(|e| ModelError::Serialization(format!("invalid artifact: {}", e)))?;
        if envelope.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::Serialization(format!(
                "unsupported artifact version {}",
                envelope.format_version
            )));
        }
        Ok(envelope)
    }

    pub fn state<S: DeserializeOwned>(self) -> Result<S, ModelError> {
        serde_json::from_value(self.state)
            .map_err(|e| ModelError::Serialization(format!("invalid {} state: {}", self.kind, e)))
    }
}
