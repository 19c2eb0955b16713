// Forecast results and the symbol universe
pub mod forecast;

// Price series types
pub mod market;

// Model keys, scaling, datasets and the regressor contract
pub mod ml;

// Forecast accuracy metrics
pub mod performance;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
