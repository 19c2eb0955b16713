pub mod artifact;
pub mod forest_regressor;
pub mod linear_regressor;
pub mod model_cache;
pub mod regressor_factory;
pub mod window_transformer;

pub use model_cache::{ArtifactRef, ModelCache, ModelHandle};
pub use regressor_factory::DefaultRegressorFactory;
pub use window_transformer::WindowTransformer;
