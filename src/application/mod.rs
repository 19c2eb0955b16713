// Forecast orchestration (single symbol and batches)
pub mod forecast;

// Series acquisition with retries
pub mod market_data;

// Windowing, regressors and the model cache
pub mod ml;
