use crate::domain::ml::model_key::ModelKey;
use thiserror::Error;

/// Errors raised while acquiring a raw price series from a provider
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Invalid fetch request for '{symbol}': {reason}")]
    InvalidRequest { symbol: String, reason: String },

    #[error("No data found for '{symbol}' in the requested period")]
    EmptySeries { symbol: String },

    #[error("Field '{field}' not found for '{symbol}' after normalization")]
    MissingField { symbol: String, field: String },

    #[error("Provider request failed for '{symbol}': {reason}")]
    Transport { symbol: String, reason: String },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::InvalidRequest { .. })
    }
}

/// Errors raised by a regressor implementation
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Training failed: {0}")]
    Training(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Model serialization failed: {0}")]
    Serialization(String),
}

/// Invalid inputs handed to the evaluator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationInputError {
    #[error("Cannot evaluate an empty series")]
    Empty,

    #[error("Series length mismatch: {truth} true values vs {prediction} predictions")]
    LengthMismatch { truth: usize, prediction: usize },

    #[error("Non-finite value at index {index}")]
    NonFinite { index: usize },
}

/// Any failure that aborts a single forecast request
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Insufficient data: need at least {required} rows, found {actual}")]
    InsufficientData { required: usize, actual: usize },

    // Location is kept for logs only; Display never shows it.
    #[error("Stored model for {key} is unreadable: {reason}")]
    ArtifactCorrupt {
        key: ModelKey,
        location: String,
        reason: String,
    },

    #[error("Model storage failed for {key}: {reason}")]
    Storage { key: ModelKey, reason: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    EvaluationInput(#[from] EvaluationInputError),

    #[error("Training aborted: {0}")]
    Training(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_retry_classification() {
        let empty = FetchError::EmptySeries {
            symbol: "AAPL".to_string(),
        };
        let invalid = FetchError::InvalidRequest {
            symbol: "AAPL".to_string(),
            reason: "start after end".to_string(),
        };

        assert!(empty.is_retryable());
        assert!(!invalid.is_retryable());
    }

    #[test]
    fn test_insufficient_data_formatting() {
        let error = ForecastError::InsufficientData {
            required: 41,
            actual: 12,
        };

        let msg = error.to_string();
        assert!(msg.contains("41"));
        assert!(msg.contains("12"));
    }

    #[test]
    fn test_artifact_corrupt_hides_location() {
        let error = ForecastError::ArtifactCorrupt {
            key: ModelKey::new("msft", 40),
            location: "/var/lib/models/msft_ws40.json".to_string(),
            reason: "expected value at line 1".to_string(),
        };

        let msg = error.to_string();
        assert!(msg.contains("MSFT"));
        assert!(!msg.contains("/var/lib"));
    }
}
