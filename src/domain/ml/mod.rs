pub mod dataset;
pub mod model_key;
pub mod regressor;
pub mod scaler;
