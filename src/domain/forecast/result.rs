use crate::domain::performance::metrics::ForecastMetrics;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastStatus {
    Success,
    Error,
}

/// How the model used for a forecast was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelOrigin {
    Trained,
    Reused,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReference {
    pub path: String,
    pub window_size: usize,
    pub origin: ModelOrigin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub last_real_value: Option<f64>,
    pub last_predicted_value: Option<f64>,
    pub metrics: ForecastMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub dates: Vec<NaiveDate>,
    pub real_values: Vec<f64>,
    pub predicted_values: Vec<f64>,
}

/// Outcome of one symbol's forecast. Error results carry only `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub symbol: String,
    pub status: ForecastStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub model: Option<ModelReference>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prediction_summary: Option<PredictionSummary>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub forecast_series: Option<ForecastSeries>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl ForecastResult {
    pub fn success(
        symbol: &str,
        model: ModelReference,
        metrics: ForecastMetrics,
        series: ForecastSeries,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            status: ForecastStatus::Success,
            model: Some(model),
            prediction_summary: Some(PredictionSummary {
                last_real_value: series.real_values.last().copied(),
                last_predicted_value: series.predicted_values.last().copied(),
                metrics,
            }),
            forecast_series: Some(series),
            message: None,
        }
    }

    pub fn error(symbol: &str, message: String) -> Self {
        Self {
            symbol: symbol.to_string(),
            status: ForecastStatus::Error,
            model: None,
            prediction_summary: None,
            forecast_series: None,
            message: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ForecastStatus::Success
    }
}

/// Envelope for batch responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<ForecastResult>,
}
